//! Error types for the sync pipeline.
//!
//! Two layers:
//! - [`ProviderError`]: one failed exchange with the calendar service
//!   (transport failure, timeout, non-success status, unusable body)
//! - [`SyncError`]: which part of a sync failed, wrapping the provider
//!   error that caused it
//!
//! Only [`SyncError::Configuration`] ever reaches the caller of a sync; every
//! other variant is logged and answered with the fallback dataset.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Credentials were rejected (401).
    AuthenticationFailed,
    /// Credentials accepted but access denied (403).
    AuthorizationFailed,
    /// Connection failed, DNS resolution, TLS, etc.
    NetworkError,
    /// The call did not complete within its bound.
    Timeout,
    /// Too many requests (429).
    RateLimited,
    /// Server returned a 5xx status.
    ServerError,
    /// Unexpected status or a body that could not be used.
    InvalidResponse,
    /// Resource not found (404).
    NotFound,
    /// The service answered but holds no usable calendar data.
    CalendarError,
    /// Unexpected local failure.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns a machine-friendly name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::CalendarError => "calendar_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error from one exchange with the calendar service.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    /// Creates an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthorizationFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Timeout, message)
    }

    /// Creates a rate limit error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    /// Creates a calendar-specific error.
    pub fn calendar(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::CalendarError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// The discovery step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoveryStage {
    /// Resolving the current user principal.
    Principal,
    /// Resolving the calendar home set.
    CalendarHome,
    /// Listing the calendar collections.
    List,
}

impl DiscoveryStage {
    /// Returns a short name for this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Principal => "principal",
            Self::CalendarHome => "calendar-home",
            Self::List => "collection-list",
        }
    }
}

impl fmt::Display for DiscoveryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while running a sync.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Required settings (credentials) are missing or unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A discovery stage failed past its fallback.
    #[error("discovery failed at {stage} stage: {source}")]
    Discovery {
        stage: DiscoveryStage,
        #[source]
        source: ProviderError,
    },

    /// One collection's range query failed.
    #[error("fetching {collection} failed: {source}")]
    Fetch {
        collection: String,
        #[source]
        source: ProviderError,
    },

    /// The live path ran past the session budget.
    #[error("live sync exceeded the {0:?} session timeout")]
    SessionTimeout(Duration),
}

impl SyncError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a discovery error for the given stage.
    pub fn discovery(stage: DiscoveryStage, source: ProviderError) -> Self {
        Self::Discovery { stage, source }
    }

    /// Creates a fetch error for the given collection.
    pub fn fetch(collection: impl Into<String>, source: ProviderError) -> Self {
        Self::Fetch {
            collection: collection.into(),
            source,
        }
    }

    /// Returns the failed discovery stage, if this is a discovery error.
    pub fn discovery_stage(&self) -> Option<DiscoveryStage> {
        match self {
            Self::Discovery { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Returns true for errors that must be surfaced to the caller.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
