//! `chronotactics calendars`.

use tracing::info;

use super::{orchestrator, render_json};
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Runs discovery and prints the session as JSON.
pub async fn run(
    config: &ClientConfig,
    identity: Option<&str>,
    secret: Option<&str>,
    pretty: bool,
) -> ClientResult<()> {
    let credentials = config.caldav.credentials(identity, secret)?;
    let session = orchestrator(config)?.discover(credentials).await?;
    info!(collections = session.collections().len(), "Discovery finished");

    println!("{}", render_json(&session, pretty)?);
    Ok(())
}
