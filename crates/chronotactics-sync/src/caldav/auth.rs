//! Account credentials and HTTP Basic authentication (RFC 7617).

use std::fmt;

use base64::Engine;

use crate::error::SyncError;

/// Account identity and app-specific secret for the calendar service.
///
/// Both values are non-empty. The `Debug` output masks them.
#[derive(Clone)]
pub struct Credentials {
    identity: String,
    secret: String,
}

impl Credentials {
    /// Creates credentials from an identity and a secret.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Configuration`] if either value is blank.
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Result<Self, SyncError> {
        let identity = identity.into().trim().to_string();
        let secret = secret.into();

        if identity.is_empty() {
            return Err(SyncError::configuration("account identity is empty"));
        }
        if secret.trim().is_empty() {
            return Err(SyncError::configuration("account secret is empty"));
        }

        Ok(Self { identity, secret })
    }

    /// Creates credentials from optional values, as read from config or env.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Configuration`] naming the first missing value.
    pub fn from_parts(identity: Option<String>, secret: Option<String>) -> Result<Self, SyncError> {
        let identity =
            identity.ok_or_else(|| SyncError::configuration("account identity is not set"))?;
        let secret = secret.ok_or_else(|| SyncError::configuration("account secret is not set"))?;
        Self::new(identity, secret)
    }

    /// Returns the account identity.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Returns the part of the identity before `@`, or all of it.
    pub fn local_part(&self) -> &str {
        self.identity
            .split_once('@')
            .map_or(self.identity.as_str(), |(local, _)| local)
    }

    /// Returns the `Authorization` header value for these credentials.
    pub(crate) fn authorization(&self) -> String {
        basic_auth(&self.identity, &self.secret)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown: String = self.identity.chars().take(3).collect();
        f.debug_struct("Credentials")
            .field("identity", &format!("{shown}***"))
            .field("secret", &"***")
            .finish()
    }
}

/// Generates a Basic authentication header value.
pub fn basic_auth(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());
    format!("Basic {}", encoded)
}
