// Centralized error handling for the unstaller

use thiserror::Error;

/// Errors raised while talking to the qBittorrent Web API
#[derive(Error, Debug)]
pub enum QbitError {
    /// Network failure, including request timeouts
    #[error("Request to qBittorrent failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Got non-ok status code on login: {status}")]
    AuthenticationFailure { status: String },

    #[error("Failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot find torrent with hash {hash} - {status}")]
    MissingTorrent { hash: String, status: String },

    /// Still answered 403 after a fresh login
    #[error("qBittorrent rejected the session for {url}")]
    Forbidden { url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_failure_message() {
        let err = QbitError::AuthenticationFailure {
            status: "403 Forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "Got non-ok status code on login: 403 Forbidden");
    }

    #[test]
    fn test_missing_torrent_message() {
        let err = QbitError::MissingTorrent {
            hash: "abc123".to_string(),
            status: "404 Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot find torrent with hash abc123 - 404 Not Found");
    }

    #[test]
    fn test_decode_error_keeps_source() {
        use std::error::Error as _;

        let source = serde_json::from_str::<Vec<u32>>("not json").unwrap_err();
        let err = QbitError::Decode {
            endpoint: "torrents/info",
            source,
        };

        assert!(err.to_string().starts_with("Failed to decode torrents/info response"));
        assert!(err.source().is_some());
    }
}
