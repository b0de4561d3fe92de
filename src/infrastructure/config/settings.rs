//! Application settings loading.
//!
//! Provides the [`Settings`] struct that bundles logging and store options.
//! Settings are loaded from a TOML file with environment variable overrides
//! for the store name and data directory.
//!
//! # Example
//!
//! ```no_run
//! use persistmap::infrastructure::config::Settings;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load("persistmap.toml")?;
//!     settings.init_logging();
//!     Ok(())
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::options::StoreOptions;
use crate::error::{ConfigError, Result};

/// Environment variable overriding `store.name`.
pub const ENV_NAME: &str = "PERSISTMAP_NAME";

/// Environment variable overriding `store.data_dir`.
pub const ENV_DATA_DIR: &str = "PERSISTMAP_DATA_DIR";

/// Top-level settings file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Options for the store.
    #[serde(default)]
    pub store: StoreOptions,
}

impl Settings {
    /// Load settings from a TOML file, then apply `.env` and environment overrides.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut settings = Self::parse_toml(&content)?;

        let _ = dotenvy::dotenv();
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Parse settings from a TOML string. No environment overrides are applied.
    ///
    /// # Errors
    /// Returns an error if the TOML is malformed.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let settings = toml::from_str(content).map_err(ConfigError::Parse)?;
        Ok(settings)
    }

    /// Apply overrides from `lookup`, typically the process environment.
    ///
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup(ENV_NAME).filter(|v| !v.is_empty()) {
            self.store.name = Some(name);
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            self.store.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
