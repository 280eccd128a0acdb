use crate::metrics::collector::Metrics;
use crate::unstaller::evaluator::{Evaluator, PassReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Runs evaluation passes on a fixed interval, one at a time
pub struct Scheduler {
    evaluator: Evaluator,
    interval: Duration,
    metrics: Arc<Metrics>,
}

impl Scheduler {
    pub fn new(evaluator: Evaluator, interval: Duration, metrics: Arc<Metrics>) -> Self {
        Self {
            evaluator,
            interval,
            metrics,
        }
    }

    /// Loop forever; the first pass runs one interval after start
    pub async fn run(self) {
        info!(interval_ms = self.interval.as_millis() as u64, "Starting unstaller loop");

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        // A slow pass pushes the schedule back instead of bunching passes
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// One scheduled pass. Errors are logged; the loop keeps going.
    pub async fn tick(&self) -> Option<PassReport> {
        self.metrics.increment_loops();

        match self.evaluator.evaluate().await {
            Ok(report) => {
                debug!(
                    stalled = report.stalled,
                    unhealthy = report.unhealthy.len(),
                    skipped = report.skipped.len(),
                    reannounced = report.reannounced,
                    "Unstaller pass completed"
                );
                Some(report)
            }
            Err(e) => {
                self.metrics.increment_failed_passes();
                error!(error = %e, "Unstaller pass failed");
                None
            }
        }
    }
}
