use anyhow::{Context, Result};
use tracing::info;

use crate::api::client::QbitClient;
use crate::core::config::Config;

// this runs at boot time
pub fn log_settings(config: &Config) {
    info!(
        url = %config.qbittorrent.url,
        username = %config.qbittorrent.username,
        password = "<redacted>",
        interval_ms = config.unstaller.interval_ms,
        stalled_limit = config.unstaller.stalled_limit,
        request_timeout_ms = config.qbittorrent.request_timeout_ms,
        metrics_port = config.server.port,
        "Using the following settings"
    );
}

/// Log in and report the qBittorrent version; fails if the Web UI is unusable
pub async fn probe_version(client: &QbitClient) -> Result<String> {
    let version = client
        .version()
        .await
        .context("Failed to fetch qBittorrent version")?;

    info!(version = %version, "qBittorrent {}", version);

    Ok(version)
}
