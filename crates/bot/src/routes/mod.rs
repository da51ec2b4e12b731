//! HTTP routes.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health          - Liveness check
//! GET  /health/ready    - Readiness check (graph ping)
//! POST /                - LINE webhook
//! POST /webhook         - LINE webhook (alias)
//! ```

pub mod webhook;

use axum::{Router, extract::State, routing::get};

use crate::error::AppError;
use crate::graph::GraphStore;
use crate::state::AppState;

/// Build all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(webhook::router())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the graph is not reachable.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state.graph().ping().await?;
    Ok("ok")
}
