//! # KPool Configuration
//!
//! Loads engine settings from TOML with environment-specific overrides and
//! installs the tracing subscriber used by KPool binaries and tests.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kpool_config::{init_tracing, load_config};
//!
//! let config = load_config(Some("production"))?;
//! init_tracing(&config.logging)?;
//! let options = config.engine_options();
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod engine_config;
pub mod logging;

pub use engine_config::{load_config, EngineConfig, EngineSettings, LoggingConfig};
pub use logging::init_tracing;
