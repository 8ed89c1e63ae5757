//! HTTP server module

mod api;
mod cohort;
mod static_files;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;

use crate::AppState;
use crate::ws::viewer_ws;

pub use api::{HealthResponse, StatusResponse};

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        .route("/api/status", get(api::status))
        .route("/cohort/:cohort", get(cohort::select))
        .route("/ws", get(viewer_ws))
        .fallback(static_files::static_handler)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
