use crate::api::session::{CookiePresence, SessionCheck, SessionJar};
use crate::core::config::QbitConfig;
use crate::core::error::QbitError;
use crate::models::torrent::TorrentInfo;
use crate::models::tracker::TrackerInfo;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

const LOGIN_PATH: &str = "/api/v2/auth/login";
const VERSION_PATH: &str = "/api/v2/app/version";
const TORRENTS_INFO_PATH: &str = "/api/v2/torrents/info";
const TRACKERS_PATH: &str = "/api/v2/torrents/trackers";
const REANNOUNCE_PATH: &str = "/api/v2/torrents/reannounce";

/// Separator qBittorrent expects between hashes in a single request
pub const HASH_SEPARATOR: &str = "|";

/// Remote operations the evaluator relies on
#[async_trait]
pub trait TorrentApi: Send + Sync {
    /// Newest stalled downloads, bounded by the configured limit
    async fn stalled_downloads(&self) -> Result<Vec<TorrentInfo>, QbitError>;

    /// Tracker list for one torrent
    async fn trackers(&self, hash: &str) -> Result<Vec<TrackerInfo>, QbitError>;

    /// Ask qBittorrent to re-announce all `hashes` in one call
    async fn reannounce(&self, hashes: &[String]) -> Result<(), QbitError>;
}

/// Cookie-authenticated client for the qBittorrent Web API
pub struct QbitClient {
    client: reqwest::Client,
    jar: Arc<SessionJar>,
    check: Box<dyn SessionCheck>,
    base_url: String,
    username: String,
    password: String,
    stalled_limit: u32,
}

impl QbitClient {
    pub fn new(config: &QbitConfig, stalled_limit: u32) -> Result<Self, QbitError> {
        Self::with_session_check(config, stalled_limit, Box::new(CookiePresence))
    }

    pub fn with_session_check(
        config: &QbitConfig,
        stalled_limit: u32,
        check: Box<dyn SessionCheck>,
    ) -> Result<Self, QbitError> {
        let base_url = config.url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| QbitError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let jar = Arc::new(SessionJar::new());
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        Ok(Self {
            client,
            jar,
            check,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
            stalled_limit,
        })
    }

    pub fn session(&self) -> &SessionJar {
        &self.jar
    }

    /// Log in unless the session check says the current session is usable
    pub async fn ensure_authenticated(&self, target: &Url) -> Result<(), QbitError> {
        if self.check.needs_login(&self.jar, target).await {
            self.login().await?;
        }
        Ok(())
    }

    /// Submit credentials; the session cookie lands in the jar
    pub async fn login(&self) -> Result<(), QbitError> {
        let url = self.endpoint(LOGIN_PATH)?;
        let credentials: &[(&str, &str)] = &[
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];

        let response = self
            .client
            .post(url)
            .header(reqwest::header::REFERER, &self.base_url)
            .form(credentials)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(QbitError::AuthenticationFailure {
                status: status.to_string(),
            });
        }

        // Wrong credentials still answer 200, with "Fails." as the body
        let body = response.text().await?;
        if body.trim() == "Fails." {
            return Err(QbitError::AuthenticationFailure {
                status: format!("{} ({})", status, body.trim()),
            });
        }

        info!(username = %self.username, "Logged in to qBittorrent");
        Ok(())
    }

    /// Application version, used for the startup log line
    pub async fn version(&self) -> Result<String, QbitError> {
        let url = self.endpoint(VERSION_PATH)?;
        let response = self.get(url).await?;
        Ok(response.text().await?.trim().to_string())
    }

    fn endpoint(&self, path: &str) -> Result<Url, QbitError> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| QbitError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    /// Authenticated GET with one re-login when the session is rejected
    async fn get(&self, url: Url) -> Result<reqwest::Response, QbitError> {
        self.ensure_authenticated(&url).await?;

        let response = self.client.get(url.clone()).send().await?;
        if response.status() != StatusCode::FORBIDDEN {
            return Ok(response);
        }

        warn!(url = %url, "qBittorrent rejected the session, logging in again");
        self.jar.clear();
        self.login().await?;

        let response = self.client.get(url.clone()).send().await?;
        if response.status() == StatusCode::FORBIDDEN {
            return Err(QbitError::Forbidden {
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    /// Re-announce URL with the hashes joined by a literal `|`
    fn reannounce_url(&self, hashes: &[String]) -> Result<Url, QbitError> {
        let mut url = self.endpoint(REANNOUNCE_PATH)?;
        // query_pairs_mut would escape the separator; hex hashes need no escaping
        url.set_query(Some(&format!("hashes={}", hashes.join(HASH_SEPARATOR))));
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        endpoint: &'static str,
    ) -> Result<T, QbitError> {
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| QbitError::Decode { endpoint, source })
    }
}

#[async_trait]
impl TorrentApi for QbitClient {
    async fn stalled_downloads(&self) -> Result<Vec<TorrentInfo>, QbitError> {
        let mut url = self.endpoint(TORRENTS_INFO_PATH)?;
        url.query_pairs_mut()
            .append_pair("filter", "stalled_downloading")
            .append_pair("limit", &self.stalled_limit.to_string())
            .append_pair("sort", "added_on")
            .append_pair("reverse", "true");

        let response = self.get(url).await?;
        let downloads: Vec<TorrentInfo> = Self::decode(response, "torrents/info").await?;

        debug!(count = downloads.len(), "Fetched stalled downloads");
        Ok(downloads)
    }

    async fn trackers(&self, hash: &str) -> Result<Vec<TrackerInfo>, QbitError> {
        let mut url = self.endpoint(TRACKERS_PATH)?;
        url.query_pairs_mut().append_pair("hash", hash);

        let response = self.get(url).await?;
        if response.status() != StatusCode::OK {
            return Err(QbitError::MissingTorrent {
                hash: hash.to_string(),
                status: response.status().to_string(),
            });
        }

        Self::decode(response, "torrents/trackers").await
    }

    async fn reannounce(&self, hashes: &[String]) -> Result<(), QbitError> {
        let url = self.reannounce_url(hashes)?;

        let response = self.get(url).await?;
        debug!(status = %response.status(), "Re-announce request answered");
        Ok(())
    }
}
