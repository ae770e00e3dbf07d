//! HTTP surface.
//!
//! | Route | Handler |
//! |---|---|
//! | `POST /api/scan` | [`handlers::submit_scan`] |
//! | `GET /api/scans` | [`handlers::list_scans`] |
//! | `GET /api/scans/{id}` | [`handlers::get_scan`] |
//! | `GET /health` | [`handlers::health`] |

mod auth;
mod error;
pub mod handlers;
mod models;

pub use auth::{parse_bearer, BearerToken};
pub use error::{ApiError, ErrorBody, Operation};
pub use models::{HealthResponse, ScanView};

use crate::manager::ScanOrchestrator;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Shared state of the HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The submission pipeline.
    pub orchestrator: Arc<ScanOrchestrator>,
}

impl AppState {
    /// Creates the state.
    pub fn new(orchestrator: Arc<ScanOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// Builds the application router. Scan upload bodies are capped at
/// `max_upload_bytes`.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route(
            "/api/scan",
            post(handlers::submit_scan).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/scans", get(handlers::list_scans))
        .route("/api/scans/{id}", get(handlers::get_scan))
        .route("/health", get(handlers::health))
        .with_state(state)
}
