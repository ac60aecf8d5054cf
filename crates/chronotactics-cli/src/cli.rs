//! Command-line interface definition.

use std::path::PathBuf;

use chronotactics_core::TracingOutputFormat;
use clap::{Parser, Subcommand, ValueEnum};

/// chronotactics - calendar sync for the ChronoTactics planner
#[derive(Debug, Parser)]
#[command(name = "chronotactics")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "CHRONOTACTICS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    /// Account identity, overriding caldav.identity
    #[arg(long, env = "CHRONOTACTICS_IDENTITY", global = true)]
    pub identity: Option<String>,

    /// App password, overriding caldav.secret
    #[arg(long, env = "CHRONOTACTICS_SECRET", hide_env_values = true, global = true)]
    pub secret: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch events and print the sync result as JSON
    Sync {
        /// Skip the network and serve the fallback dataset
        #[arg(long)]
        simulate: bool,

        /// JSON file of events already held, merged before the fetched ones
        #[arg(long, value_name = "FILE")]
        merge: Option<PathBuf>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Discover the account's calendar collections
    Calendars {
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Check whether the CalDAV server answers
    Probe,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration with plain secrets masked
    Dump,
    /// Check that the configuration builds a usable client
    Validate,
    /// Show the configuration file path
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl From<LogFormat> for TracingOutputFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Compact => TracingOutputFormat::Compact,
            LogFormat::Pretty => TracingOutputFormat::Pretty,
            LogFormat::Json => TracingOutputFormat::Json,
        }
    }
}
