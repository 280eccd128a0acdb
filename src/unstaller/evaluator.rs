use crate::api::client::TorrentApi;
use crate::core::error::QbitError;
use crate::metrics::collector::Metrics;
use crate::models::torrent::TorrentInfo;
use crate::unstaller::classify::{classify, TrackerHealth};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of one evaluation pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Stalled downloads returned by qBittorrent
    pub stalled: usize,
    pub healthy: Vec<String>,
    /// Hashes with at least one failing tracker, in classification order
    pub unhealthy: Vec<String>,
    /// Hashes that could not be classified this pass
    pub skipped: Vec<String>,
    pub reannounced: bool,
}

/// Finds stalled downloads caused by failing trackers and re-announces them
pub struct Evaluator {
    api: Arc<dyn TorrentApi>,
    metrics: Arc<Metrics>,
}

impl Evaluator {
    pub fn new(api: Arc<dyn TorrentApi>, metrics: Arc<Metrics>) -> Self {
        Self { api, metrics }
    }

    /// Run one pass: list, classify each torrent, repair the unhealthy ones.
    ///
    /// Listing errors abort the pass. Errors for a single torrent only
    /// skip that torrent.
    pub async fn evaluate(&self) -> Result<PassReport, QbitError> {
        let downloads = self.api.stalled_downloads().await?;

        if downloads.is_empty() {
            debug!("No stalled downloads");
            return Ok(PassReport::default());
        }

        info!(count = downloads.len(), "Found stalled downloads");

        let mut report = PassReport {
            stalled: downloads.len(),
            ..PassReport::default()
        };

        for torrent in &downloads {
            match self.classify_tracker(torrent).await {
                Ok(TrackerHealth::Healthy) => {
                    self.metrics.record_stalled(true);
                    report.healthy.push(torrent.hash.clone());
                }
                Ok(TrackerHealth::Unhealthy) => {
                    self.metrics.record_stalled(false);
                    report.unhealthy.push(torrent.hash.clone());
                }
                Err(e) => {
                    warn!(
                        hash = %torrent.hash,
                        name = %torrent.name,
                        error = %e,
                        "Could not classify stalled download, skipping"
                    );
                    self.metrics.increment_missing();
                    report.skipped.push(torrent.hash.clone());
                }
            }
        }

        report.reannounced = self.repair(&report.unhealthy).await;

        Ok(report)
    }

    /// Fetch the trackers of `torrent` and classify them
    pub async fn classify_tracker(&self, torrent: &TorrentInfo) -> Result<TrackerHealth, QbitError> {
        let trackers = self.api.trackers(&torrent.hash).await?;

        for tracker in &trackers {
            self.metrics.record_tracker_status(tracker.status);
        }

        let health = classify(trackers.iter().map(|tracker| tracker.status));

        if health == TrackerHealth::Unhealthy {
            let failing: Vec<&str> = trackers
                .iter()
                .filter(|tracker| !tracker.status.is_healthy())
                .map(|tracker| tracker.url.as_str())
                .collect();

            info!(
                hash = %torrent.hash,
                name = %torrent.name,
                state = %torrent.state,
                progress = torrent.progress,
                failing_trackers = ?failing,
                "Stalled download has a non-working tracker"
            );
        } else {
            debug!(
                hash = %torrent.hash,
                name = %torrent.name,
                trackers = trackers.len(),
                "Stalled download has working trackers"
            );
        }

        Ok(health)
    }

    /// Re-announce `hashes` in a single request. Returns whether a request
    /// was sent and accepted; failures are logged and not retried.
    pub async fn repair(&self, hashes: &[String]) -> bool {
        if hashes.is_empty() {
            return false;
        }

        match self.api.reannounce(hashes).await {
            Ok(()) => {
                self.metrics.increment_reannounces();
                info!(hashes = ?hashes, "Reannounced stalled downloads");
                true
            }
            Err(e) => {
                self.metrics.increment_failed_reannounces();
                error!(hashes = ?hashes, error = %e, "Failed to reannounce stalled downloads");
                false
            }
        }
    }
}
