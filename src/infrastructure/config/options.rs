//! Per-store construction options.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::adapter::outbound::sqlite::Durability;
use crate::domain::ValueEncoding;
use crate::error::ConfigError;

/// Directory used when no `data_dir` is configured, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Database file shared by every store in a data directory.
pub const DATABASE_FILE: &str = "enmap.sqlite";

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

/// Options for constructing a [`PersistentMapStore`](crate::PersistentMapStore).
///
/// Every field has a default so the struct can be embedded in a TOML file;
/// `name` is still required at construction time.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Logical store name, sanitized into the table name.
    pub name: Option<String>,

    /// Directory holding the database file.
    ///
    /// Defaults to `./data`, which is created on construction when missing.
    /// An explicit directory must already exist.
    pub data_dir: Option<PathBuf>,

    /// How values are written to the `value` column.
    pub encoding: ValueEncoding,

    /// `PRAGMA synchronous` level for the store's connection.
    pub durability: Durability,

    /// `PRAGMA busy_timeout` in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// How long opening the database may take before failing.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            name: None,
            data_dir: None,
            encoding: ValueEncoding::default(),
            durability: Durability::default(),
            busy_timeout_ms: default_busy_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl StoreOptions {
    /// Options for a store with the given logical name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: ValueEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    #[must_use]
    pub fn with_durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The configured name, rejecting a missing or blank one.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingField`] when `name` is absent or blank.
    pub fn require_name(&self) -> Result<&str, ConfigError> {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => Ok(name),
            _ => Err(ConfigError::MissingField { field: "name" }),
        }
    }

    /// Validate option values that do not depend on the filesystem.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.require_name()?;
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "connect_timeout_ms",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}
