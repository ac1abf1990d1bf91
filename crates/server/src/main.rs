use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use tokendrop_core::config::AppConfig;
use tokendrop_metadata::TokenStore;
use tokendrop_server::{create_router, AppState};
use tokendrop_storage::BlobStore;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// tokendrop server: token-gated anonymous file handoff
#[derive(Parser, Debug)]
#[command(name = "tokendropd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "TOKENDROP_CONFIG", default_value = "config/server.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("tokendrop v{}", env!("CARGO_PKG_VERSION"));

    let mut figment = Figment::new();
    if std::path::Path::new(&args.config).exists() {
        tracing::info!(path = %args.config, "loading configuration file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::debug!(path = %args.config, "no configuration file, using environment only");
    }
    let config: AppConfig = figment
        .merge(Env::prefixed("TOKENDROP_").split("__"))
        .extract()
        .context("failed to load configuration (auth credentials are required)")?;

    let tokens =
        Arc::new(TokenStore::open(&config.metadata.path).context("failed to open token store")?);
    tracing::info!(path = %config.metadata.path.display(), "token store ready");

    let blobs = Arc::new(
        BlobStore::new(&config.storage.path)
            .await
            .context("failed to initialize blob storage")?,
    );
    tracing::info!(path = %config.storage.path.display(), "blob storage ready");

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {:?}", config.server.bind))?;

    let state = AppState::new(config, tokens, blobs);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
