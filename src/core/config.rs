use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub qbittorrent: QbitConfig,
    #[serde(default)]
    pub unstaller: UnstallerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the qBittorrent Web UI
#[derive(Clone, Deserialize)]
pub struct QbitConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnstallerConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_stalled_limit")]
    pub stalled_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

// Default value functions
fn default_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "adminadmin".to_string()
}

fn default_request_timeout_ms() -> u64 {
    1000
}

fn default_interval_ms() -> u64 {
    10_000 // 10 seconds
}

fn default_stalled_limit() -> u32 {
    10
}

fn default_port() -> u16 {
    2112
}

fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

impl Default for QbitConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: default_username(),
            password: default_password(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

// Hand-written so the password never ends up in logs
impl std::fmt::Debug for QbitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QbitConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl QbitConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for UnstallerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            stalled_limit: default_stalled_limit(),
        }
    }
}

impl UnstallerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            num_threads: default_num_threads(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: default_console(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate qBittorrent config
        let url = Url::parse(&self.qbittorrent.url)
            .context(format!("Invalid qBittorrent url '{}'", self.qbittorrent.url))?;

        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "qBittorrent url must use http or https, got '{}'",
                url.scheme()
            );
        }

        if self.qbittorrent.username.is_empty() {
            bail!("username must not be empty");
        }

        if self.qbittorrent.request_timeout_ms == 0 {
            bail!("request_timeout_ms must be greater than 0");
        }

        // Validate unstaller config
        if self.unstaller.interval_ms == 0 {
            bail!("interval_ms must be greater than 0");
        }

        if self.unstaller.stalled_limit == 0 {
            bail!("stalled_limit must be greater than 0");
        }

        // Validate server config
        if self.server.port == 0 {
            bail!("Server port must be greater than 0");
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").expect("Failed to parse empty config");

        assert_eq!(config.qbittorrent.url, "http://localhost:8080");
        assert_eq!(config.qbittorrent.username, "admin");
        assert_eq!(config.qbittorrent.password, "adminadmin");
        assert_eq!(config.qbittorrent.request_timeout(), Duration::from_secs(1));
        assert_eq!(config.unstaller.interval(), Duration::from_secs(10));
        assert_eq!(config.unstaller.stalled_limit, 10);
        assert_eq!(config.server.port, 2112);
        assert!(config.server.num_threads > 0);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[qbittorrent]
url = "https://luna.lan/qbittorrent"
username = "seedbox"
password = "hunter2"

[unstaller]
interval_ms = 30000
stalled_limit = 25

[server]
port = 9100
num_threads = 2
"#
        )
        .unwrap();

        let config = Config::from_file(&file.path().to_path_buf()).expect("Failed to load config");

        assert_eq!(config.qbittorrent.url, "https://luna.lan/qbittorrent");
        assert_eq!(config.qbittorrent.username, "seedbox");
        assert_eq!(config.qbittorrent.password, "hunter2");
        assert_eq!(config.qbittorrent.request_timeout_ms, 1000);
        assert_eq!(config.unstaller.interval(), Duration::from_secs(30));
        assert_eq!(config.unstaller.stalled_limit, 25);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.num_threads, 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = PathBuf::from("does-not-exist/config.toml");
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_invalid_url_rejected() {
        let result = Config::from_toml("[qbittorrent]\nurl = \"not a url\"\n");
        assert!(result.is_err());

        let result = Config::from_toml("[qbittorrent]\nurl = \"ftp://example.com\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = Config::from_toml("[unstaller]\ninterval_ms = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = Config::from_toml("[qbittorrent]\nrequest_timeout_ms = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let result = Config::from_toml("[logging]\nlevel = \"loud\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_log_format_rejected() {
        let result = Config::from_toml("[logging]\nformat = \"xml\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = QbitConfig {
            password: "super-secret".to_string(),
            ..QbitConfig::default()
        };

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
