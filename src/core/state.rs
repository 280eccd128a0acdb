// Application state (AppState)

use crate::metrics::collector::Metrics;
use std::sync::Arc;

/// Shared state for the metrics and health endpoints
#[derive(Clone)]
pub struct AppState {
    /// Counters written by the unstaller loop
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}
