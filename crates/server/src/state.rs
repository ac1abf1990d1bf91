use std::sync::Arc;

use tokendrop_core::config::AppConfig;
use tokendrop_metadata::TokenStore;
use tokendrop_storage::BlobStore;

use crate::transfer::TransferCoordinator;

/// Shared application state, cloned per request by axum.
///
/// Both stores are injected by the caller; nothing here reaches for process
/// globals, which keeps tests free to run any number of isolated instances.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub coordinator: Arc<TransferCoordinator>,
}

impl AppState {
    pub fn new(config: AppConfig, tokens: Arc<TokenStore>, blobs: Arc<BlobStore>) -> Self {
        let coordinator =
            TransferCoordinator::new(tokens, blobs, config.server.token_id_size);
        Self {
            config: Arc::new(config),
            coordinator: Arc::new(coordinator),
        }
    }
}
