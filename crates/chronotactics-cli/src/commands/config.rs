//! Configuration commands.

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Dump the effective configuration to stdout.
pub fn dump(config: &ClientConfig) -> ClientResult<()> {
    if let Some(path) = ClientConfig::default_path() {
        println!("# config.toml ({})", path.display());
    }
    println!("{}", config.to_redacted_toml()?);
    Ok(())
}

/// Validate the configuration without touching the network.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    config.caldav.to_caldav_config()?;
    config.sync.to_sync_config()?;
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path() -> ClientResult<()> {
    match ClientConfig::default_path() {
        Some(path) => println!("config: {}", path.display()),
        None => println!("config: no configuration directory on this platform"),
    }
    Ok(())
}
