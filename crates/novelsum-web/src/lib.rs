//! HTTP shell: one page plus a small JSON/SSE API over per-session state.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod models;
pub mod state;
pub mod template;
pub mod upload;

pub use state::AppState;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes());

    Router::new()
        .route("/", get(handlers::index::index))
        .route("/health", get(handlers::index::health))
        .route("/api/sessions", post(handlers::sessions::create))
        .route(
            "/api/sessions/{id}",
            get(handlers::sessions::show).delete(handlers::sessions::delete),
        )
        .route(
            "/api/sessions/{id}/upload",
            post(handlers::upload::upload),
        )
        .route(
            "/api/sessions/{id}/params",
            put(handlers::params::set_params),
        )
        .route(
            "/api/sessions/{id}/generate",
            post(handlers::generate::generate),
        )
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
