//! `chronotactics probe`.

use std::process::ExitCode;

use super::orchestrator;
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Reports whether the server answers. Unreachable exits with status 2.
pub async fn run(config: &ClientConfig) -> ClientResult<ExitCode> {
    let orchestrator = orchestrator(config)?;
    let url = orchestrator.caldav_config().url_str().to_string();

    if orchestrator.probe().await {
        println!("{url}: reachable");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{url}: unreachable");
        Ok(ExitCode::from(2))
    }
}
