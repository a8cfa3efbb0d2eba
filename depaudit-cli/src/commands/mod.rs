//! Command handlers -- one module per subcommand

pub mod config;
pub mod graph;
pub mod jas;

use std::path::Path;

use depaudit_core::config::DepauditConfig;

use crate::error::CliError;

/// Load the effective configuration.
///
/// A missing file is not an error: defaults plus environment overrides are used.
pub async fn load_config(path: &Path) -> Result<DepauditConfig, CliError> {
    if tokio::fs::try_exists(path).await? {
        return Ok(DepauditConfig::load(path).await?);
    }
    let mut config = DepauditConfig::default();
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}
