use crate::models::tracker::TrackerStatus;
use crate::utils::time::current_timestamp;
use anyhow::{Context, Result};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const TRACKER_STATUSES: [TrackerStatus; 6] = [
    TrackerStatus::Disabled,
    TrackerStatus::NotContacted,
    TrackerStatus::Working,
    TrackerStatus::Updating,
    TrackerStatus::NotWorking,
    TrackerStatus::Unknown(-1),
];

/// Unstaller counters, registered under the `qbit_unstaller_` names
/// scrapers already know
pub struct Metrics {
    registry: Registry,
    loops_made: IntCounter,
    passes_failed: IntCounter,
    stalled_downloads: IntCounterVec,
    tracker_status: IntCounterVec,
    missing_torrents: IntCounter,
    reannounces_sent: IntCounter,
    reannounces_failed: IntCounter,
    pub start_time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub loops_made: u64,
    pub passes_failed: u64,
    #[serde(rename = "stalled_downloads_working_tracker")]
    pub stalled_working_tracker: u64,
    #[serde(rename = "stalled_downloads_non_working_tracker")]
    pub stalled_non_working_tracker: u64,
    pub missing_torrents: u64,
    pub reannounces_sent: u64,
    pub reannounces_failed: u64,
    /// Trackers seen per status label
    pub tracker_status: BTreeMap<String, u64>,
    pub uptime_seconds: i64,
}

fn counter(name: &str, help: &str) -> Result<IntCounter> {
    Ok(IntCounter::with_opts(Opts::new(name, help))?)
}

impl Metrics {
    /// Build the registry with every unstaller collector registered
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let loops_made = counter("qbit_unstaller_loops_made", "The number of unstaller loops made")?;
        let passes_failed = counter(
            "qbit_unstaller_passes_failed",
            "The number of unstaller loops that aborted with an error",
        )?;
        let stalled_downloads = IntCounterVec::new(
            Opts::new("qbit_unstaller_stalled_downloads", "The number of stalled downloads seen"),
            &["working_tracker"],
        )?;
        let tracker_status = IntCounterVec::new(
            Opts::new("qbit_unstaller_tracker_status", "The status of the trackers"),
            &["state"],
        )?;
        let missing_torrents = counter(
            "qbit_unstaller_missing_torrents",
            "Stalled downloads whose trackers could not be fetched",
        )?;
        let reannounces_sent = counter(
            "qbit_unstaller_reannounces_sent",
            "Batched re-announce requests accepted by qBittorrent",
        )?;
        let reannounces_failed = counter(
            "qbit_unstaller_reannounces_failed",
            "Batched re-announce requests that failed",
        )?;

        registry.register(Box::new(loops_made.clone()))?;
        registry.register(Box::new(passes_failed.clone()))?;
        registry.register(Box::new(stalled_downloads.clone()))?;
        registry.register(Box::new(tracker_status.clone()))?;
        registry.register(Box::new(missing_torrents.clone()))?;
        registry.register(Box::new(reannounces_sent.clone()))?;
        registry.register(Box::new(reannounces_failed.clone()))?;

        Ok(Self {
            registry,
            loops_made,
            passes_failed,
            stalled_downloads,
            tracker_status,
            missing_torrents,
            reannounces_sent,
            reannounces_failed,
            start_time: current_timestamp(),
        })
    }

    pub fn increment_loops(&self) {
        self.loops_made.inc();
    }

    pub fn increment_failed_passes(&self) {
        self.passes_failed.inc();
    }

    /// Count a classified stalled download
    pub fn record_stalled(&self, working_tracker: bool) {
        let label = if working_tracker { "true" } else { "false" };
        self.stalled_downloads.with_label_values(&[label]).inc();
    }

    pub fn record_tracker_status(&self, status: TrackerStatus) {
        self.tracker_status.with_label_values(&[status.label()]).inc();
    }

    pub fn tracker_status_count(&self, status: TrackerStatus) -> u64 {
        self.tracker_status.with_label_values(&[status.label()]).get()
    }

    pub fn increment_missing(&self) {
        self.missing_torrents.inc();
    }

    pub fn increment_reannounces(&self) {
        self.reannounces_sent.inc();
    }

    pub fn increment_failed_reannounces(&self) {
        self.reannounces_failed.inc();
    }

    /// Prometheus text exposition of every registered counter
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .context("failed to encode Prometheus metrics")?;
        String::from_utf8(buffer).context("metrics output was not valid UTF-8")
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        let tracker_status = TRACKER_STATUSES
            .iter()
            .map(|status| (status.label().to_string(), self.tracker_status_count(*status)))
            .collect();

        MetricsSnapshot {
            loops_made: self.loops_made.get(),
            passes_failed: self.passes_failed.get(),
            stalled_working_tracker: self.stalled_downloads.with_label_values(&["true"]).get(),
            stalled_non_working_tracker: self.stalled_downloads.with_label_values(&["false"]).get(),
            missing_torrents: self.missing_torrents.get(),
            reannounces_sent: self.reannounces_sent.get(),
            reannounces_failed: self.reannounces_failed.get(),
            tracker_status,
            uptime_seconds: current_timestamp() - self.start_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics() {
        let metrics = Metrics::new().unwrap();

        let snapshot = metrics.get_snapshot();
        assert_eq!(snapshot.loops_made, 0);
        assert_eq!(snapshot.passes_failed, 0);
        assert_eq!(snapshot.reannounces_sent, 0);
        assert!(metrics.start_time > 0);
    }

    #[test]
    fn test_record_stalled_by_tracker_health() {
        let metrics = Metrics::new().unwrap();

        metrics.record_stalled(true);
        metrics.record_stalled(false);
        metrics.record_stalled(false);

        let snapshot = metrics.get_snapshot();
        assert_eq!(snapshot.stalled_working_tracker, 1);
        assert_eq!(snapshot.stalled_non_working_tracker, 2);
    }

    #[test]
    fn test_unknown_statuses_share_a_bucket() {
        let metrics = Metrics::new().unwrap();

        metrics.record_tracker_status(TrackerStatus::Unknown(5));
        metrics.record_tracker_status(TrackerStatus::Unknown(42));
        metrics.record_tracker_status(TrackerStatus::Working);

        assert_eq!(metrics.tracker_status_count(TrackerStatus::Unknown(0)), 2);
        assert_eq!(metrics.tracker_status_count(TrackerStatus::Working), 1);
        assert_eq!(metrics.tracker_status_count(TrackerStatus::NotWorking), 0);
    }

    #[test]
    fn test_get_snapshot_empty() {
        let metrics = Metrics::new().unwrap();

        let snapshot = metrics.get_snapshot();

        assert_eq!(snapshot.loops_made, 0);
        assert_eq!(snapshot.passes_failed, 0);
        assert_eq!(snapshot.stalled_working_tracker, 0);
        assert_eq!(snapshot.stalled_non_working_tracker, 0);
        assert_eq!(snapshot.missing_torrents, 0);
        assert_eq!(snapshot.tracker_status.len(), 6);
        assert!(snapshot.tracker_status.values().all(|count| *count == 0));
        assert!(snapshot.uptime_seconds >= 0);
    }

    #[test]
    fn test_get_snapshot_with_data() {
        let metrics = Metrics::new().unwrap();

        metrics.increment_loops();
        metrics.increment_loops();
        metrics.increment_failed_passes();
        metrics.increment_missing();
        metrics.increment_reannounces();
        metrics.increment_failed_reannounces();
        metrics.record_tracker_status(TrackerStatus::NotWorking);
        metrics.record_tracker_status(TrackerStatus::Disabled);
        metrics.record_tracker_status(TrackerStatus::Disabled);

        let snapshot = metrics.get_snapshot();

        assert_eq!(snapshot.loops_made, 2);
        assert_eq!(snapshot.passes_failed, 1);
        assert_eq!(snapshot.missing_torrents, 1);
        assert_eq!(snapshot.reannounces_sent, 1);
        assert_eq!(snapshot.reannounces_failed, 1);
        assert_eq!(snapshot.tracker_status["not_working"], 1);
        assert_eq!(snapshot.tracker_status["disabled"], 2);
        assert_eq!(snapshot.tracker_status["working"], 0);
    }

    #[test]
    fn test_render_uses_exported_names_and_labels() {
        let metrics = Metrics::new().unwrap();
        metrics.increment_loops();
        metrics.record_stalled(false);
        metrics.record_stalled(true);
        metrics.record_tracker_status(TrackerStatus::NotWorking);

        let rendered = metrics.render().unwrap();

        assert!(rendered.contains("# TYPE qbit_unstaller_loops_made counter"));
        assert!(rendered.contains("qbit_unstaller_loops_made 1"));
        assert!(rendered.contains("qbit_unstaller_stalled_downloads{working_tracker=\"false\"} 1"));
        assert!(rendered.contains("qbit_unstaller_stalled_downloads{working_tracker=\"true\"} 1"));
        assert!(rendered.contains("qbit_unstaller_tracker_status{state=\"not_working\"} 1"));
    }

    #[test]
    fn test_snapshot_field_names() {
        let metrics = Metrics::new().unwrap();
        metrics.record_stalled(false);

        let json = serde_json::to_value(metrics.get_snapshot()).unwrap();

        assert_eq!(json["stalled_downloads_non_working_tracker"], 1);
        assert_eq!(json["stalled_downloads_working_tracker"], 0);
        assert!(json["tracker_status"].is_object());
    }
}
