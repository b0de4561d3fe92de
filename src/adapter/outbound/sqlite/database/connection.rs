//! Database connection management using Diesel ORM.
//!
//! Provides connection pooling and per-connection pragma configuration for
//! SQLite database files.

use std::time::Duration;

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Type alias for a SQLite connection pool.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// SQLite `synchronous` level applied to every connection.
///
/// Lower levels trade crash durability for write throughput.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Durability {
    Off,
    Normal,
    #[default]
    Full,
    Extra,
}

impl Durability {
    /// Pragma keyword for this level.
    #[must_use]
    pub const fn as_pragma(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
            Self::Extra => "EXTRA",
        }
    }
}

/// Create a single-connection pool for the given database path.
///
/// The pool establishes its connection eagerly, so an unopenable path fails
/// here once `connect_timeout` elapses.
///
/// # Errors
/// Returns an error if the pool cannot be created.
pub fn create_pool(database_url: &str, connect_timeout: Duration) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .max_size(1)
        .connection_timeout(connect_timeout)
        .build(manager)
        .map_err(|e| Error::Connection(e.to_string()))
}

/// Configure SQLite connection pragmas.
///
/// # Errors
/// Returns an error if a pragma fails to apply.
pub fn configure_connection(
    conn: &mut SqliteConnection,
    durability: Durability,
    busy_timeout: Duration,
) -> Result<()> {
    diesel::sql_query(format!("PRAGMA busy_timeout={}", busy_timeout.as_millis()))
        .execute(conn)
        .map_err(|e| Error::Database(e.to_string()))?;
    diesel::sql_query(format!("PRAGMA synchronous={}", durability.as_pragma()))
        .execute(conn)
        .map_err(|e| Error::Database(e.to_string()))?;
    Ok(())
}
