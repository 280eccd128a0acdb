// Metrics endpoints

use crate::core::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Prometheus scrape target
///
/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Returns JSON with all unstaller statistics including:
/// - Loops made and failed passes
/// - Stalled downloads seen, split by tracker health
/// - Tracker status histogram
/// - Re-announces sent and failed
///
/// GET /stats
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.metrics.get_snapshot();

    (StatusCode::OK, Json(snapshot)).into_response()
}
