//! Subcommand implementations.

pub mod calendars;
pub mod config;
pub mod probe;
pub mod sync;

use chronotactics_sync::SyncOrchestrator;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Builds an HTTP-backed orchestrator from the loaded configuration.
pub(crate) fn orchestrator(config: &ClientConfig) -> ClientResult<SyncOrchestrator> {
    let caldav = config.caldav.to_caldav_config()?;
    let sync = config.sync.to_sync_config()?;
    Ok(SyncOrchestrator::with_http(caldav, sync)?)
}

pub(crate) fn render_json<T: Serialize>(value: &T, pretty: bool) -> ClientResult<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
