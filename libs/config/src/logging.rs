//! Tracing subscriber setup

use crate::engine_config::LoggingConfig;
use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber described by `config`
///
/// `RUST_LOG` takes precedence over `config.level`. Returns `Ok(false)` when a
/// global subscriber was already installed, for example by an earlier call.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    let configured = EnvFilter::try_new(&config.level)
        .with_context(|| format!("Invalid log filter: {}", config.level))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or(configured);

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    Ok(installed)
}
