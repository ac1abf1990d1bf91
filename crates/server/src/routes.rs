use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the application router.
///
/// `/create` and `/list` require a session; `/single`, `/transfer` and
/// `/download` are open to anyone holding a token id.
pub fn create_router(state: AppState) -> Router {
    let max_body = state.config.server.max_body_bytes;
    Router::new()
        .route("/login", get(handlers::login))
        .route("/create", get(handlers::create))
        .route("/list", get(handlers::list))
        .route("/single", get(handlers::single))
        .route("/transfer", post(handlers::transfer))
        .route("/download", get(handlers::download))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
