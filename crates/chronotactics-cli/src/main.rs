//! chronotactics CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use chronotactics_cli::cli::{Cli, Command, ConfigAction};
use chronotactics_cli::commands;
use chronotactics_cli::config::ClientConfig;
use chronotactics_cli::error::ClientResult;
use chronotactics_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::debug()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing_config.with_format(cli.log_format.into())) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<ExitCode> {
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };
    let identity = cli.identity.as_deref();
    let secret = cli.secret.as_deref();

    match cli.command {
        Command::Sync {
            simulate,
            merge,
            pretty,
        } => {
            let merge = merge.as_deref();
            commands::sync::run(&config, identity, secret, simulate, merge, pretty).await?
        }
        Command::Calendars { pretty } => {
            commands::calendars::run(&config, identity, secret, pretty).await?
        }
        Command::Probe => return commands::probe::run(&config).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config)?,
            ConfigAction::Validate => commands::config::validate(&config)?,
            ConfigAction::Path => commands::config::path()?,
        },
    }
    Ok(ExitCode::SUCCESS)
}
