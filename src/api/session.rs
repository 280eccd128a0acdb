use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::Url;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cookie store holding the qBittorrent session
///
/// Wraps reqwest's `Jar` so the whole session can be dropped and
/// re-established without rebuilding the HTTP client.
#[derive(Default)]
pub struct SessionJar {
    inner: RwLock<Jar>,
}

impl SessionJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any cookie would be sent with a request to `url`
    pub fn has_cookies(&self, url: &Url) -> bool {
        self.read().cookies(url).is_some()
    }

    /// Forget every stored cookie
    pub fn clear(&self) {
        *self.write() = Jar::default();
    }

    #[cfg(test)]
    pub(crate) fn add_cookie_str(&self, cookie: &str, url: &Url) {
        self.read().add_cookie_str(cookie, url);
    }

    fn read(&self) -> RwLockReadGuard<'_, Jar> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Jar> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CookieStore for SessionJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.read().set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.read().cookies(url)
    }
}

/// Decides whether a login is required before calling `target`
#[async_trait]
pub trait SessionCheck: Send + Sync {
    async fn needs_login(&self, jar: &SessionJar, target: &Url) -> bool;
}

/// Treats any cookie scoped to the target as a live session.
///
/// Does not notice sessions that expired server-side; the client
/// recovers from those when a call is answered with 403.
#[derive(Debug, Default, Clone, Copy)]
pub struct CookiePresence;

#[async_trait]
impl SessionCheck for CookiePresence {
    async fn needs_login(&self, jar: &SessionJar, target: &Url) -> bool {
        !jar.has_cookies(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_new_jar_is_empty() {
        let jar = SessionJar::new();
        assert!(!jar.has_cookies(&url("http://localhost:8080/api/v2/app/version")));
    }

    #[test]
    fn test_cookie_scoped_to_host() {
        let jar = SessionJar::new();
        jar.add_cookie_str("SID=abc123; HttpOnly; path=/", &url("http://localhost:8080/api/v2/auth/login"));

        assert!(jar.has_cookies(&url("http://localhost:8080/api/v2/torrents/info")));
        assert!(!jar.has_cookies(&url("http://otherhost:8080/api/v2/torrents/info")));
    }

    #[test]
    fn test_clear_drops_session() {
        let jar = SessionJar::new();
        let target = url("http://localhost:8080/api/v2/torrents/info");
        jar.add_cookie_str("SID=abc123; path=/", &target);
        assert!(jar.has_cookies(&target));

        jar.clear();

        assert!(!jar.has_cookies(&target));
        assert!(jar.cookies(&target).is_none());
    }

    #[test]
    fn test_set_cookies_through_store_trait() {
        let jar = SessionJar::new();
        let target = url("http://localhost:8080/api/v2/auth/login");
        let header = HeaderValue::from_static("SID=xyz; path=/");

        jar.set_cookies(&mut std::iter::once(&header), &target);

        let sent = jar.cookies(&target).unwrap();
        assert_eq!(sent.to_str().unwrap(), "SID=xyz");
    }

    #[tokio::test]
    async fn test_cookie_presence_check() {
        let jar = SessionJar::new();
        let target = url("http://localhost:8080/api/v2/torrents/info");

        assert!(CookiePresence.needs_login(&jar, &target).await);

        jar.add_cookie_str("SID=abc123; path=/", &target);
        assert!(!CookiePresence.needs_login(&jar, &target).await);
    }
}
