//! `chronotactics sync`.

use std::path::Path;

use chrono::{DateTime, Utc};
use chronotactics_core::{NormalizedEvent, SyncResult, SyncSource};
use chronotactics_sync::decode_bridge_events;
use serde::Serialize;
use tracing::info;

use super::{orchestrator, render_json};
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// What `sync` prints: the sync result, with held events ahead of the
/// fetched ones when `--merge` is given.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutput {
    pub source: SyncSource,
    pub events: Vec<NormalizedEvent>,
    pub synced_at: DateTime<Utc>,
}

impl SyncOutput {
    pub fn new(result: SyncResult, held: Vec<NormalizedEvent>) -> Self {
        let source = result.source();
        let synced_at = result.synced_at();
        Self {
            source,
            events: result.merge_into(held),
            synced_at,
        }
    }
}

/// Reads a JSON array of events held by the caller.
pub fn load_held(path: &Path) -> ClientResult<Vec<NormalizedEvent>> {
    let json = std::fs::read_to_string(path)?;
    Ok(decode_bridge_events(&json)?)
}

pub async fn run(
    config: &ClientConfig,
    identity: Option<&str>,
    secret: Option<&str>,
    simulate: bool,
    merge: Option<&Path>,
    pretty: bool,
) -> ClientResult<()> {
    let held = match merge {
        Some(path) => load_held(path)?,
        None => Vec::new(),
    };

    let orchestrator = orchestrator(config)?;
    let result = if simulate {
        orchestrator.simulate()
    } else {
        let credentials = config.caldav.credentials(identity, secret)?;
        orchestrator.sync(credentials).await
    };
    info!(
        source = %result.source(),
        events = result.events().len(),
        held = held.len(),
        "Sync finished"
    );

    println!("{}", render_json(&SyncOutput::new(result, held), pretty)?);
    Ok(())
}
