use serde::Deserialize;

/// Tracker status codes as reported by qBittorrent
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "i64")]
pub enum TrackerStatus {
    /// Inactive on purpose; used for DHT, PeX and LSD
    Disabled,
    NotContacted,
    Working,
    Updating,
    /// Contacted, but not working or not sending proper replies
    NotWorking,
    Unknown(i64),
}

impl From<i64> for TrackerStatus {
    fn from(code: i64) -> Self {
        match code {
            0 => TrackerStatus::Disabled,
            1 => TrackerStatus::NotContacted,
            2 => TrackerStatus::Working,
            3 => TrackerStatus::Updating,
            4 => TrackerStatus::NotWorking,
            other => TrackerStatus::Unknown(other),
        }
    }
}

impl TrackerStatus {
    /// Label used for metrics
    pub fn label(&self) -> &'static str {
        match self {
            TrackerStatus::Disabled => "disabled",
            TrackerStatus::NotContacted => "not_contacted",
            TrackerStatus::Working => "working",
            TrackerStatus::Updating => "updating",
            TrackerStatus::NotWorking => "not_working",
            TrackerStatus::Unknown(_) => "unknown",
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, TrackerStatus::Working | TrackerStatus::Disabled)
    }
}

/// One entry of `/api/v2/torrents/trackers`
#[derive(Clone, Debug, Deserialize)]
pub struct TrackerInfo {
    #[serde(default)]
    pub url: String,
    pub status: TrackerStatus,
    #[serde(default)]
    pub num_peers: i64,
    #[serde(default)]
    pub num_seeds: i64,
    #[serde(default)]
    pub num_leeches: i64,
    #[serde(default)]
    pub num_downloaded: i64,
    /// Free-form message set by the tracker admins
    #[serde(default)]
    pub msg: String,
}
