//! REST API handlers

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::relay::RelayStatsSnapshot;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the server
    pub status: String,
    /// Server version
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
}

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Relay status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Cohort currently followed, if any
    pub cohort: Option<String>,
    /// Whether a subscription is open
    pub active: bool,
    /// Number of connected viewers
    pub viewers: usize,
    /// Delivery counters since start
    pub stats: RelayStatsSnapshot,
    /// Seconds since server started
    pub uptime_seconds: i64,
}

/// Relay status endpoint
///
/// Returns the current cohort, whether it is being consumed, how many
/// viewers are connected, and the delivery counters.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        cohort: state.relay.current_cohort().map(|c| c.to_string()),
        active: state.relay.is_active(),
        viewers: state.broadcaster.viewer_count(),
        stats: state.relay.stats(),
        uptime_seconds: state.uptime_seconds(),
    })
}
