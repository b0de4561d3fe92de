//! SQLite table driver.
//!
//! Implements the [`Connector`] and [`TableDriver`] ports on top of Diesel.
//! Each driver acquires one pooled connection at open time and holds it
//! until it is closed or dropped.

use std::path::Path;
use std::time::Duration;

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::sql_types::Text;
use diesel::SqliteConnection;
use tracing::debug;

use crate::adapter::outbound::sqlite::database::connection::{
    configure_connection, create_pool, Durability,
};
use crate::adapter::outbound::sqlite::database::model::{MapRow, RowCount};
use crate::domain::TableName;
use crate::error::{Error, Result};
use crate::infrastructure::config::StoreOptions;
use crate::port::{Connector, StoredRow, TableDriver};

/// Opens [`SqliteDriver`]s with a fixed set of connection settings.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    durability: Durability,
    busy_timeout: Duration,
    connect_timeout: Duration,
}

impl SqliteConnector {
    #[must_use]
    pub fn new(durability: Durability, busy_timeout: Duration, connect_timeout: Duration) -> Self {
        Self {
            durability,
            busy_timeout,
            connect_timeout,
        }
    }

    /// Connection settings taken from store options.
    #[must_use]
    pub fn from_options(options: &StoreOptions) -> Self {
        Self::new(
            options.durability,
            Duration::from_millis(options.busy_timeout_ms),
            Duration::from_millis(options.connect_timeout_ms),
        )
    }

    #[must_use]
    pub fn durability(&self) -> Durability {
        self.durability
    }
}

impl Default for SqliteConnector {
    fn default() -> Self {
        Self::from_options(&StoreOptions::default())
    }
}

impl Connector for SqliteConnector {
    type Driver = SqliteDriver;

    fn connect(&self, database: &Path) -> Result<SqliteDriver> {
        let pool = create_pool(&database.to_string_lossy(), self.connect_timeout)?;
        let mut conn = pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;
        configure_connection(&mut conn, self.durability, self.busy_timeout)?;

        debug!(path = %database.display(), durability = ?self.durability, "Opened SQLite connection");
        Ok(SqliteDriver { conn })
    }
}

/// SQLite-backed table driver holding one connection.
pub struct SqliteDriver {
    conn: PooledConnection<ConnectionManager<SqliteConnection>>,
}

impl TableDriver for SqliteDriver {
    fn table_exists(&mut self, table: &TableName) -> Result<bool> {
        let row: RowCount = diesel::sql_query(
            "SELECT count(*) AS count FROM sqlite_master WHERE type='table' AND name = ?",
        )
        .bind::<Text, _>(table.as_str())
        .get_result(&mut self.conn)
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(row.count > 0)
    }

    fn create_table(&mut self, table: &TableName) -> Result<()> {
        diesel::sql_query(format!(
            "CREATE TABLE IF NOT EXISTS {} (key TEXT PRIMARY KEY, value TEXT)",
            table.quoted()
        ))
        .execute(&mut self.conn)
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    fn load_rows(&mut self, table: &TableName) -> Result<Vec<StoredRow>> {
        let rows: Vec<MapRow> = diesel::sql_query(format!(
            "SELECT key, value FROM {}",
            table.quoted()
        ))
        .load(&mut self.conn)
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(rows.into_iter().map(StoredRow::from).collect())
    }

    fn upsert(&mut self, table: &TableName, key: &str, value: &str) -> Result<()> {
        diesel::sql_query(format!(
            "INSERT OR REPLACE INTO {} (key, value) VALUES (?, ?)",
            table.quoted()
        ))
        .bind::<Text, _>(key)
        .bind::<Text, _>(value)
        .execute(&mut self.conn)
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    fn remove(&mut self, table: &TableName, key: &str) -> Result<usize> {
        diesel::sql_query(format!("DELETE FROM {} WHERE key = ?", table.quoted()))
            .bind::<Text, _>(key)
            .execute(&mut self.conn)
            .map_err(|e| Error::Database(e.to_string()))
    }

    fn close(self) -> Result<()> {
        // The pool is owned by the connection guard; dropping both closes the file.
        drop(self.conn);
        Ok(())
    }
}
