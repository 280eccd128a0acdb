use serde::Deserialize;

/// One entry of `/api/v2/torrents/info`
///
/// Only `hash` and `name` drive decisions; the rest is kept for logging.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TorrentInfo {
    /// Time (Unix epoch) when the torrent was added to the client
    pub added_on: i64,
    /// Amount of data left to download (bytes)
    pub amount_left: i64,
    /// Whether this torrent is managed by Automatic Torrent Management
    pub auto_tmm: bool,
    /// Percentage of file pieces currently available
    pub availability: f64,
    pub category: String,
    /// Amount of transfer data completed (bytes)
    pub completed: i64,
    pub completion_on: i64,
    /// Download speed limit (bytes/s), -1 if unlimited
    pub dl_limit: i64,
    /// Download speed (bytes/s)
    pub dlspeed: i64,
    pub downloaded: i64,
    pub downloaded_session: i64,
    /// ETA in seconds
    pub eta: i64,
    pub f_l_piece_prio: bool,
    pub force_start: bool,
    /// Info hash, the torrent's identity in every other call
    pub hash: String,
    pub last_activity: i64,
    pub magnet_uri: String,
    pub max_ratio: f64,
    pub max_seeding_time: i64,
    pub name: String,
    /// Seeds in the swarm
    pub num_complete: i64,
    /// Leechers in the swarm
    pub num_incomplete: i64,
    pub num_leechs: i64,
    pub num_seeds: i64,
    /// -1 if queuing is disabled or torrent is in seed mode
    pub priority: i64,
    /// Progress as a fraction (0.0 - 1.0)
    pub progress: f64,
    pub ratio: f64,
    pub ratio_limit: f64,
    pub save_path: String,
    pub seeding_time_limit: i64,
    pub seen_complete: i64,
    pub seq_dl: bool,
    pub size: i64,
    pub state: String,
    pub super_seeding: bool,
    /// Comma-concatenated tag list
    pub tags: String,
    pub time_active: i64,
    pub total_size: i64,
    /// First tracker with working status, empty if none
    pub tracker: String,
    pub up_limit: i64,
    pub uploaded: i64,
    pub uploaded_session: i64,
    pub upspeed: i64,
}
