use crate::core::state::AppState;
use crate::utils::time::current_timestamp;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: i64,
    pub uptime_seconds: i64,
    /// Passes started by the scheduler so far
    pub loops_made: u64,
}

/// Liveness of the metrics server and the unstaller loop
///
/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = current_timestamp();
    let snapshot = state.metrics.get_snapshot();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            timestamp: now,
            uptime_seconds: now - state.metrics.start_time,
            loops_made: snapshot.loops_made,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::collector::Metrics;
    use axum::body::Body;
    use http_body_util::BodyExt;

    fn create_test_state() -> Arc<AppState> {
        Arc::new(AppState::new(Arc::new(Metrics::new().unwrap())))
    }

    async fn read_health(state: Arc<AppState>) -> HealthResponse {
        let response = health_handler(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let (_, body) = response.into_parts();
        let bytes = Body::new(body).collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let health = read_health(create_test_state()).await;

        assert_eq!(health.status, "ok");
        assert!(health.timestamp > 0);
        assert!(health.uptime_seconds >= 0);
        assert_eq!(health.loops_made, 0);
    }

    #[tokio::test]
    async fn test_health_counts_loops() {
        let state = create_test_state();
        state.metrics.increment_loops();
        state.metrics.increment_loops();

        let health = read_health(state).await;

        assert_eq!(health.loops_made, 2);
    }
}
