use crate::models::tracker::TrackerStatus;

/// Tracker health of a single torrent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerHealth {
    /// Every tracker is working or intentionally disabled
    Healthy,
    /// At least one tracker is not contacted, updating or not working
    Unhealthy,
}

/// Classify a torrent by the statuses of its trackers.
///
/// One bad tracker is enough to mark the torrent unhealthy. An empty
/// tracker list is healthy.
pub fn classify<I>(statuses: I) -> TrackerHealth
where
    I: IntoIterator<Item = TrackerStatus>,
{
    if statuses.into_iter().all(|status| status.is_healthy()) {
        TrackerHealth::Healthy
    } else {
        TrackerHealth::Unhealthy
    }
}
