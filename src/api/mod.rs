//! REST API for running optimizations and reading run history.
//!
//! - `POST /optimizations`: run one optimization and record it
//! - `GET /optimizations`: recent runs, optionally filtered by objective
//! - `GET /optimizations/stats`: aggregates over completed runs

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::config::Config;
use crate::optimize::Engine;

pub use types::{ErrorResponse, HistoryParams, OptimizeBody};

/// State shared across request handlers.
///
/// The engine is the only moving part; concurrent requests share it
/// without locking.
pub struct AppState {
    pub engine: Engine,
    /// Fallbacks for fields a request leaves out.
    pub defaults: Config,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/optimizations",
            get(handlers::list_runs).post(handlers::create_run),
        )
        .route("/optimizations/stats", get(handlers::get_stats))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
