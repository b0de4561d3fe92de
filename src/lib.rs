//! Persistmap - SQLite persistence for in-memory key-value maps.
//!
//! A [`PersistentMapStore`] owns one table inside a shared SQLite file. On
//! [`init`](PersistentMapStore::init) it loads every row into a map the
//! caller owns; afterwards `set`/`delete` (and their async variants) are
//! mirrored into the table so the map survives restarts.
//!
//! # Architecture
//!
//! - **`domain`** - Table name sanitization, key validation, value encoding
//! - **`port`** - Collaborator traits: [`MapSink`] for the in-memory map,
//!   [`Connector`](port::Connector)/[`TableDriver`](port::TableDriver) for storage
//! - **`adapter`** - SQLite driver using Diesel with an r2d2 pool
//! - **`application`** - The store lifecycle and readiness signal
//! - **`infrastructure`** - Options, TOML settings and logging
//!
//! # Features
//!
//! - `testkit` - Expose [`testkit::MemoryConnector`] for integration tests
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashMap;
//!
//! use persistmap::{PersistentMapStore, StoreOptions};
//! use serde_json::Value;
//!
//! # async fn run() -> persistmap::Result<()> {
//! let store = PersistentMapStore::new(StoreOptions::new("users").with_data_dir("/var/lib/bot"))?;
//! let mut users: HashMap<String, Value> = HashMap::new();
//! store.init(&mut users).await?;
//! store.set("alice", &serde_json::json!({"level": 3}))?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use adapter::outbound::sqlite::{Durability, SqliteConnector};
pub use application::{PersistentMapStore, Readiness, StoreState};
pub use domain::{sanitize, MapKey, TableName, ValueEncoding};
pub use error::{ConfigError, Error, Result, StateError};
pub use infrastructure::config::{LoggingConfig, Settings, StoreOptions};
pub use port::MapSink;
