// HTTP routes configuration

use crate::core::state::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::handlers::health::health_handler))
        .route("/metrics", get(crate::handlers::metrics::metrics_handler))
        .route("/stats", get(crate::handlers::metrics::stats_handler))

        // 404 fallback for all unmatched routes
        .fallback(crate::handlers::fallback::fallback_handler)

        .with_state(state)
}
