//! CLI command implementations.

pub mod config;
pub mod get;

use std::path::PathBuf;

use anyhow::{Context, Result};
use repofetch_fetch::FetchConfig;
use tracing::debug;

use crate::Cli;

/// Returns the configuration file the CLI reads.
pub fn config_path(cli: &Cli) -> PathBuf {
    cli.config.clone().unwrap_or_else(FetchConfig::default_path)
}

/// Loads the configuration file and applies command-line overrides.
pub fn load_config(cli: &Cli) -> Result<FetchConfig> {
    let path = config_path(cli);
    let mut config = FetchConfig::load_from(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;

    if let Some(primary) = &cli.primary {
        config.primary_url.clone_from(primary);
    }
    if let Some(fallback) = &cli.fallback {
        config.fallback_url.clone_from(fallback);
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if let Some(attempts) = cli.attempts {
        config.max_attempts = attempts;
    }

    debug!(?config, "Effective configuration");
    Ok(config)
}
