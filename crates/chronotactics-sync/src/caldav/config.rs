//! CalDAV service configuration.

use std::time::Duration;

use chrono::{DateTime, Utc};
use chronotactics_core::TimeWindow;
use url::Url;

use super::auth::Credentials;

/// Configuration for talking to a CalDAV service.
#[derive(Debug, Clone)]
pub struct CalDavConfig {
    /// Service root URL; discovery starts here.
    pub url: Url,

    /// Path template used when the calendar home cannot be read from the
    /// principal. `{username}` expands to the identity's local part and
    /// `{identity}` to the whole identity, both URL-encoded.
    pub home_fallback_template: Option<String>,

    /// Days to look back from now when querying events.
    pub lookbehind_days: u32,

    /// Days to look ahead from now when querying events.
    pub lookahead_days: u32,

    /// Maximum number of collections queried at once.
    pub max_concurrent_fetches: usize,

    /// Whether to verify TLS certificates.
    pub verify_tls: bool,

    /// Bound on each individual request.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl CalDavConfig {
    /// iCloud's CalDAV service root.
    pub const DEFAULT_URL: &'static str = "https://caldav.icloud.com/";

    /// Calendar home used when the principal does not advertise one.
    pub const DEFAULT_HOME_FALLBACK: &'static str = "/{username}/calendars/";

    /// Default lookbehind days.
    pub const DEFAULT_LOOKBEHIND_DAYS: u32 = 30;

    /// Default lookahead days.
    pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 30;

    /// Default per-request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

    /// Default number of concurrent collection queries.
    pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;

    /// Creates a new CalDAV configuration with the given service root.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(url.as_ref())?;
        Ok(Self {
            url: parsed,
            home_fallback_template: Some(Self::DEFAULT_HOME_FALLBACK.to_string()),
            lookbehind_days: Self::DEFAULT_LOOKBEHIND_DAYS,
            lookahead_days: Self::DEFAULT_LOOKAHEAD_DAYS,
            max_concurrent_fetches: Self::DEFAULT_MAX_CONCURRENT_FETCHES,
            verify_tls: true,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("chronotactics/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Configuration for iCloud with every default.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the default URL is valid.
    pub fn icloud() -> Result<Self, url::ParseError> {
        Self::new(Self::DEFAULT_URL)
    }

    /// Sets the calendar home fallback template. `None` disables the fallback.
    pub fn with_home_fallback(mut self, template: Option<String>) -> Self {
        self.home_fallback_template = template;
        self
    }

    /// Sets the lookbehind days.
    pub fn with_lookbehind_days(mut self, days: u32) -> Self {
        self.lookbehind_days = days;
        self
    }

    /// Sets the lookahead days.
    pub fn with_lookahead_days(mut self, days: u32) -> Self {
        self.lookahead_days = days;
        self
    }

    /// Sets the collection fan-out bound. Zero is treated as one.
    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max.max(1);
        self
    }

    /// Disables TLS verification (for testing only).
    pub fn with_insecure_tls(mut self) -> Self {
        self.verify_tls = false;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the service root as a string.
    pub fn url_str(&self) -> &str {
        self.url.as_str()
    }

    /// Returns the query window around `now`.
    pub fn fetch_window(&self, now: DateTime<Utc>) -> TimeWindow {
        TimeWindow::around(now, self.lookbehind_days, self.lookahead_days)
    }

    /// Expands the home fallback template for `credentials`.
    ///
    /// Returns `None` when no template is set or the expansion does not form
    /// a valid URL against the service root.
    pub fn home_fallback(&self, credentials: &Credentials) -> Option<String> {
        let template = self.home_fallback_template.as_deref()?;
        let path = template
            .replace("{username}", &urlencoding::encode(credentials.local_part()))
            .replace("{identity}", &urlencoding::encode(credentials.identity()));
        self.url.join(&path).ok().map(String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn creds() -> Credentials {
        Credentials::new("ana.lopez@icloud.com", "abcd-efgh").unwrap()
    }

    #[test]
    fn config_defaults() {
        let config = CalDavConfig::icloud().unwrap();
        assert_eq!(config.url.as_str(), "https://caldav.icloud.com/");
        assert_eq!(config.lookbehind_days, 30);
        assert_eq!(config.lookahead_days, 30);
        assert_eq!(config.max_concurrent_fetches, 4);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.verify_tls);
    }

    #[test]
    fn config_builder_methods() {
        let config = CalDavConfig::new("https://caldav.example.com/")
            .unwrap()
            .with_lookbehind_days(7)
            .with_lookahead_days(14)
            .with_max_concurrent_fetches(0)
            .with_insecure_tls()
            .with_timeout(Duration::from_secs(60));

        assert_eq!(config.lookbehind_days, 7);
        assert_eq!(config.lookahead_days, 14);
        assert_eq!(config.max_concurrent_fetches, 1);
        assert!(!config.verify_tls);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn invalid_url_returns_error() {
        assert!(CalDavConfig::new("not a valid url").is_err());
    }

    #[test]
    fn fetch_window_uses_days() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let window = CalDavConfig::icloud()
            .unwrap()
            .with_lookbehind_days(1)
            .with_lookahead_days(2)
            .fetch_window(now);

        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 3, 14, 12, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 3, 17, 12, 0, 0).unwrap());
    }

    #[test]
    fn home_fallback_expands_username() {
        let config = CalDavConfig::icloud().unwrap();
        assert_eq!(
            config.home_fallback(&creds()).as_deref(),
            Some("https://caldav.icloud.com/ana.lopez/calendars/")
        );
    }

    #[test]
    fn home_fallback_encodes_identity() {
        let config = CalDavConfig::new("https://dav.example.com/")
            .unwrap()
            .with_home_fallback(Some("/homes/{identity}/".into()));
        assert_eq!(
            config.home_fallback(&creds()).as_deref(),
            Some("https://dav.example.com/homes/ana.lopez%40icloud.com/")
        );
    }

    #[test]
    fn home_fallback_can_be_disabled() {
        let config = CalDavConfig::icloud().unwrap().with_home_fallback(None);
        assert!(config.home_fallback(&creds()).is_none());
    }
}
