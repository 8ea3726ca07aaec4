use anyhow::Context;
use relay_dns_domain::config::{CliOverrides, Config};

/// Loads, overrides and validates the configuration. Runs before logging
/// is initialised, so problems are reported through the returned error.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
