//! ChronoTactics command-line client.
//!
//! Loads `config.toml`, resolves credentials, and drives the sync pipeline
//! from `chronotactics-sync`, printing results as JSON.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
