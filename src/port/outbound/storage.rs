//! Storage driver port.
//!
//! One narrow interface covers every SQL binding: a [`Connector`] opens a
//! [`TableDriver`] for a database file, and the driver performs the handful
//! of single-table operations the store needs.

use std::path::Path;

use crate::domain::TableName;
use crate::error::Result;

/// A raw row as stored: text key, nullable text value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub key: String,
    pub value: Option<String>,
}

/// Opens drivers for a database file.
pub trait Connector: Send + Sync + 'static {
    type Driver: TableDriver;

    /// Open a connection to the database at `database`.
    ///
    /// # Errors
    /// Returns a connection error if the file cannot be opened.
    fn connect(&self, database: &Path) -> Result<Self::Driver>;
}

/// Single-table operations on an open connection.
///
/// Implementations must bind keys and values as statement parameters.
/// Table names are pre-sanitized and may be spliced into SQL text quoted.
pub trait TableDriver: Send + 'static {
    /// Whether `table` exists in the schema.
    fn table_exists(&mut self, table: &TableName) -> Result<bool>;

    /// Create `table` with schema `(key TEXT PRIMARY KEY, value TEXT)`.
    fn create_table(&mut self, table: &TableName) -> Result<()>;

    /// Read every row of `table`.
    fn load_rows(&mut self, table: &TableName) -> Result<Vec<StoredRow>>;

    /// Insert the row, replacing any existing row with the same key.
    fn upsert(&mut self, table: &TableName, key: &str, value: &str) -> Result<()>;

    /// Remove the row for `key`. Returns the number of rows removed.
    fn remove(&mut self, table: &TableName, key: &str) -> Result<usize>;

    /// Release the connection.
    fn close(self) -> Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}
