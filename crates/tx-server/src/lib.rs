//! Tractatus generator HTTP server (Axum).
//!
//! Serves the upload, generation and chat endpoints, the embedded web pages,
//! and a small client used by the `tractatus` CLI.

pub mod client;
pub mod error;
pub mod pages;
pub mod routes;
pub mod state;

use axum::Router;
use state::AppState;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tx_core::TractatusConfig;

/// Build the application router against the configured providers.
pub fn app(config: TractatusConfig) -> tx_llm::Result<Router> {
    Ok(app_with_state(AppState::new(config)?))
}

/// Build the application router with a custom state.
pub fn app_with_state(state: AppState) -> Router {
    let max_upload = state.config.upload.max_bytes;
    let max_body = state.config.generation.max_body_bytes;
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::upload_routes(max_upload))
        .merge(routes::generation_routes(max_body))
        .merge(pages::page_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
