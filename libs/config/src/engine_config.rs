//! Engine Configuration Module
//!
//! Loads KPool engine settings from a TOML file, an optional
//! environment-specific overlay, and `KPOOL_` prefixed environment variables.

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use kpool_amm::{EngineOptions, SwapRounding, MAX_DECIMALS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DEFAULT_CONFIG_PATH: &str = "config/kpool.toml";
const ENV_PREFIX: &str = "KPOOL";

/// Top-level configuration
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub engine: EngineSettings,
    pub logging: LoggingConfig,
}

/// Pool engine settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    /// Largest decimals value accepted at pool initialization
    pub max_decimals: u8,
    pub swap_rounding: SwapRounding,
}

/// Tracing subscriber settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub level: String,
    pub json: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_decimals: MAX_DECIMALS,
            swap_rounding: SwapRounding::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from files with environment overrides
    ///
    /// An explicit `base_path` must exist. The default path is optional, so a
    /// bare checkout runs on defaults plus environment variables. The overlay
    /// for `environment` is read from `environments/{env}.toml` next to the
    /// base file.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        Self::load_with_prefix(base_path, environment, ENV_PREFIX)
    }

    fn load_with_prefix(
        base_path: Option<&Path>,
        environment: Option<&str>,
        env_prefix: &str,
    ) -> Result<Self> {
        let (base, required) = match base_path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        let mut builder = Config::builder().add_source(File::from(base.as_path()).required(required));

        if let Some(env) = environment {
            let env_file = base
                .parent()
                .unwrap_or(Path::new("."))
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // KPOOL_ENGINE__MAX_DECIMALS=6 overrides engine.max_decimals
        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        debug!(
            max_decimals = config.engine.max_decimals,
            swap_rounding = ?config.engine.swap_rounding,
            "Engine configuration loaded"
        );
        Ok(config)
    }

    /// Reject settings the engine cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.engine.max_decimals > MAX_DECIMALS {
            bail!(
                "engine.max_decimals = {} exceeds the supported maximum of {}",
                self.engine.max_decimals,
                MAX_DECIMALS
            );
        }
        if self.logging.level.trim().is_empty() {
            bail!("logging.level must not be empty");
        }
        Ok(())
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            max_decimals: self.engine.max_decimals,
            swap_rounding: self.engine.swap_rounding,
        }
    }
}

/// Convenience function to load configuration from the default location
pub fn load_config(environment: Option<&str>) -> Result<EngineConfig> {
    EngineConfig::load(None, environment)
}
