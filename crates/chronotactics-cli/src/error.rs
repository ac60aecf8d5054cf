//! Error types for the CLI.

use chronotactics_sync::{ProviderError, SyncError};
use thiserror::Error;

/// Errors surfaced to the user by a command.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configuration file or a value in it is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// The sync pipeline failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The HTTP transport could not be built.
    #[error("transport error: {0}")]
    Provider(#[from] ProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI operations.
pub type ClientResult<T> = Result<T, ClientError>;
