//! Client configuration.
//!
//! Read from `~/.config/chronotactics/config.toml`; every key is optional.
//!
//! ```toml
//! [caldav]
//! url = "https://caldav.icloud.com/"
//! identity = "env::ICLOUD_EMAIL"
//! secret = "pass::icloud/app-password"
//! lookahead_days = 14
//!
//! [sync]
//! session_timeout_secs = 15
//! fallback_path = "~/calendars/offline.ics"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chronotactics_sync::{CalDavConfig, Credentials, SyncConfig, SyncError};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::secret::{self, SecretRef};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub caldav: CalDavSettings,
    pub sync: SyncSettings,
}

/// The `[caldav]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalDavSettings {
    pub url: String,
    /// Account identity, or a `pass::`/`env::` reference to it.
    pub identity: Option<String>,
    /// App password, or a `pass::`/`env::` reference to it.
    pub secret: Option<String>,
    /// Calendar-home template used when the server does not report one.
    /// An empty string turns the fallback off.
    pub home_fallback: String,
    pub lookbehind_days: u32,
    pub lookahead_days: u32,
    pub max_concurrent_fetches: usize,
    pub timeout_secs: u64,
    pub verify_tls: bool,
}

impl Default for CalDavSettings {
    fn default() -> Self {
        Self {
            url: CalDavConfig::DEFAULT_URL.to_string(),
            identity: Some("env::ICLOUD_EMAIL".to_string()),
            secret: Some("env::ICLOUD_PASSWORD".to_string()),
            home_fallback: CalDavConfig::DEFAULT_HOME_FALLBACK.to_string(),
            lookbehind_days: CalDavConfig::DEFAULT_LOOKBEHIND_DAYS,
            lookahead_days: CalDavConfig::DEFAULT_LOOKAHEAD_DAYS,
            max_concurrent_fetches: CalDavConfig::DEFAULT_MAX_CONCURRENT_FETCHES,
            timeout_secs: CalDavConfig::DEFAULT_TIMEOUT_SECS,
            verify_tls: true,
        }
    }
}

impl CalDavSettings {
    /// Builds the provider configuration.
    pub fn to_caldav_config(&self) -> ClientResult<CalDavConfig> {
        let template = Some(self.home_fallback.clone()).filter(|t| !t.trim().is_empty());
        let mut config = CalDavConfig::new(&self.url)
            .map_err(|e| ClientError::Config(format!("invalid caldav.url `{}`: {}", self.url, e)))?
            .with_home_fallback(template)
            .with_lookbehind_days(self.lookbehind_days)
            .with_lookahead_days(self.lookahead_days)
            .with_max_concurrent_fetches(self.max_concurrent_fetches)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if !self.verify_tls {
            config = config.with_insecure_tls();
        }
        Ok(config)
    }

    /// Resolves credentials, preferring the given overrides to the file values.
    ///
    /// # Errors
    ///
    /// A reference that cannot be resolved, or a missing or blank value, is a
    /// configuration error.
    pub fn credentials(
        &self,
        identity: Option<&str>,
        secret: Option<&str>,
    ) -> ClientResult<Credentials> {
        let identity = resolve_field("identity", identity.or(self.identity.as_deref()))?;
        let secret = resolve_field("secret", secret.or(self.secret.as_deref()))?;
        Ok(Credentials::from_parts(identity, secret)?)
    }

    /// A copy safe to print: plain-text secrets are masked, references kept.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        let plain = copy
            .secret
            .as_deref()
            .is_some_and(|secret| !SecretRef::parse(secret).is_reference());
        if plain {
            copy.secret = Some("***".to_string());
        }
        copy
    }
}

fn resolve_field(name: &str, value: Option<&str>) -> ClientResult<Option<String>> {
    value
        .map(|v| {
            secret::resolve(v).map_err(|e| {
                let message = format!("failed to resolve caldav.{name}: {e}");
                ClientError::from(SyncError::configuration(message))
            })
        })
        .transpose()
}

/// The `[sync]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub probe_timeout_secs: u64,
    pub session_timeout_secs: u64,
    /// Calendar file served instead of the bundled dataset when offline.
    pub fallback_path: Option<PathBuf>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            probe_timeout_secs: SyncConfig::DEFAULT_PROBE_TIMEOUT_SECS,
            session_timeout_secs: SyncConfig::DEFAULT_SESSION_TIMEOUT_SECS,
            fallback_path: None,
        }
    }
}

impl SyncSettings {
    /// Builds the orchestrator configuration, reading the fallback file if set.
    pub fn to_sync_config(&self) -> ClientResult<SyncConfig> {
        let mut config = SyncConfig::default()
            .with_probe_timeout(Duration::from_secs(self.probe_timeout_secs))
            .with_session_timeout(Duration::from_secs(self.session_timeout_secs));
        if let Some(path) = &self.fallback_path {
            let path = expand_home(path);
            let text = std::fs::read_to_string(&path).map_err(|e| {
                let path = path.display();
                ClientError::Config(format!("failed to read fallback file {path}: {e}"))
            })?;
            config = config.with_fallback_ics(text);
        }
        Ok(config)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

impl ClientConfig {
    /// Loads from the default path, or returns defaults if the file is absent.
    pub fn load() -> ClientResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&contents)
            .map_err(|e| ClientError::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// `~/.config/chronotactics/config.toml` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("chronotactics").join("config.toml"))
    }

    /// Renders the configuration as TOML with plain-text secrets masked.
    pub fn to_redacted_toml(&self) -> ClientResult<String> {
        let redacted = Self {
            caldav: self.caldav.redacted(),
            sync: self.sync.clone(),
        };
        toml::to_string_pretty(&redacted)
            .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_target_icloud() {
        let config = ClientConfig::default();

        assert_eq!(config.caldav.url, "https://caldav.icloud.com/");
        assert_eq!(config.caldav.identity.as_deref(), Some("env::ICLOUD_EMAIL"));
        assert_eq!(config.caldav.secret.as_deref(), Some("env::ICLOUD_PASSWORD"));
        assert_eq!(config.caldav.home_fallback, "/{username}/calendars/");
        assert_eq!(config.sync.session_timeout_secs, 15);
        assert_eq!(config.sync.probe_timeout_secs, 2);
        assert!(config.caldav.verify_tls);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file = write_config(
            r#"
[caldav]
url = "https://dav.example.com/"
lookahead_days = 7

[sync]
session_timeout_secs = 30
"#,
        );

        let config = ClientConfig::load_from(file.path()).unwrap();

        assert_eq!(config.caldav.url, "https://dav.example.com/");
        assert_eq!(config.caldav.lookahead_days, 7);
        assert_eq!(config.caldav.lookbehind_days, 30);
        assert_eq!(config.sync.session_timeout_secs, 30);
        assert_eq!(config.sync.probe_timeout_secs, 2);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let file = write_config("[caldav\nurl = ");
        let err = ClientConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn invalid_url_is_rejected() {
        let settings = CalDavSettings {
            url: "not a url".to_string(),
            ..CalDavSettings::default()
        };
        assert!(matches!(settings.to_caldav_config(), Err(ClientError::Config(_))));
    }

    #[test]
    fn builds_caldav_config() {
        let settings = CalDavSettings {
            home_fallback: String::new(),
            max_concurrent_fetches: 0,
            verify_tls: false,
            ..CalDavSettings::default()
        };

        let config = settings.to_caldav_config().unwrap();
        let creds = Credentials::new("someone@icloud.com", "pw").unwrap();

        assert_eq!(config.home_fallback(&creds), None);
        assert_eq!(config.max_concurrent_fetches, 1);
        assert!(!config.verify_tls);
    }

    #[test]
    fn credentials_resolve_env_references() {
        unsafe {
            std::env::set_var("_CHRONOTACTICS_CFG_IDENTITY", "someone@icloud.com");
            std::env::set_var("_CHRONOTACTICS_CFG_SECRET", "app-password");
        }
        let settings = CalDavSettings {
            identity: Some("env::_CHRONOTACTICS_CFG_IDENTITY".to_string()),
            secret: Some("env::_CHRONOTACTICS_CFG_SECRET".to_string()),
            ..CalDavSettings::default()
        };

        let creds = settings.credentials(None, None).unwrap();
        assert_eq!(creds.identity(), "someone@icloud.com");

        unsafe {
            std::env::remove_var("_CHRONOTACTICS_CFG_IDENTITY");
            std::env::remove_var("_CHRONOTACTICS_CFG_SECRET");
        }
    }

    #[test]
    fn overrides_win_over_file_values() {
        let settings = CalDavSettings {
            identity: Some("file@icloud.com".to_string()),
            secret: Some("file-pw".to_string()),
            ..CalDavSettings::default()
        };

        let creds = settings.credentials(Some("flag@icloud.com"), Some("flag-pw")).unwrap();
        assert_eq!(creds.identity(), "flag@icloud.com");
    }

    #[test]
    fn missing_credentials_are_a_configuration_error() {
        let settings = CalDavSettings {
            identity: None,
            secret: Some("pw".to_string()),
            ..CalDavSettings::default()
        };
        let err = settings.credentials(None, None).unwrap_err();
        assert!(matches!(err, ClientError::Sync(ref e) if e.is_configuration()));

        let settings = CalDavSettings {
            identity: Some("env::_CHRONOTACTICS_CFG_UNSET_12345".to_string()),
            ..CalDavSettings::default()
        };
        let err = settings.credentials(None, None).unwrap_err();
        assert!(err.to_string().contains("caldav.identity"));
    }

    #[test]
    fn fallback_file_is_read() {
        let file = write_config("BEGIN:VCALENDAR\nEND:VCALENDAR\n");
        let settings = SyncSettings {
            fallback_path: Some(file.path().to_path_buf()),
            ..SyncSettings::default()
        };

        let config = settings.to_sync_config().unwrap();
        assert_eq!(config.fallback_ics.as_deref(), Some("BEGIN:VCALENDAR\nEND:VCALENDAR\n"));
    }

    #[test]
    fn missing_fallback_file_errors() {
        let settings = SyncSettings {
            fallback_path: Some(PathBuf::from("/nonexistent/chronotactics/offline.ics")),
            ..SyncSettings::default()
        };
        assert!(matches!(settings.to_sync_config(), Err(ClientError::Config(_))));
    }

    #[test]
    fn dump_masks_plain_secret() {
        let mut config = ClientConfig::default();
        config.caldav.secret = Some("hunter2".to_string());

        let dumped = config.to_redacted_toml().unwrap();
        assert!(!dumped.contains("hunter2"));
        assert!(dumped.contains("***"));

        let dumped = ClientConfig::default().to_redacted_toml().unwrap();
        assert!(dumped.contains("env::ICLOUD_PASSWORD"));
    }
}
