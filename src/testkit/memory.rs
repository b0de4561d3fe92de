//! In-process storage connector.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::domain::TableName;
use crate::error::{Error, Result};
use crate::port::{Connector, StoredRow, TableDriver};

type Tables = BTreeMap<String, BTreeMap<String, Option<String>>>;

#[derive(Debug, Default)]
struct MemoryState {
    tables: Mutex<Tables>,
    refuse: AtomicBool,
    connect_delay_ms: AtomicU64,
    connects: AtomicUsize,
}

/// Connector whose tables live in memory and are shared by every clone.
///
/// The database path is ignored; all drivers opened from one connector
/// (and its clones) see the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    state: Arc<MemoryState>,
}

impl MemoryConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `connect` calls fail with a connection error.
    pub fn refuse_connections(&self, refuse: bool) {
        self.state.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Block every subsequent `connect` call for `delay` before it proceeds.
    pub fn delay_connections(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.state.connect_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of successful `connect` calls.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn has_table(&self, table: &str) -> bool {
        self.state.tables.lock().contains_key(table)
    }

    #[must_use]
    pub fn row_count(&self, table: &str) -> usize {
        self.state.tables.lock().get(table).map_or(0, BTreeMap::len)
    }

    /// Stored value for `key`: `None` if the row is absent, `Some(None)` for SQL `NULL`.
    #[must_use]
    pub fn raw_value(&self, table: &str, key: &str) -> Option<Option<String>> {
        self.state
            .tables
            .lock()
            .get(table)
            .and_then(|rows| rows.get(key).cloned())
    }

    /// Write a raw row, creating the table if needed.
    pub fn insert_raw(&self, table: &str, key: &str, value: Option<&str>) {
        self.state
            .tables
            .lock()
            .entry(table.to_owned())
            .or_default()
            .insert(key.to_owned(), value.map(str::to_owned));
    }
}

impl Connector for MemoryConnector {
    type Driver = MemoryDriver;

    fn connect(&self, _database: &Path) -> Result<MemoryDriver> {
        let delay = self.state.connect_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }
        if self.state.refuse.load(Ordering::SeqCst) {
            return Err(Error::Connection("connection refused".into()));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryDriver {
            state: Arc::clone(&self.state),
        })
    }
}

/// Driver opened by [`MemoryConnector`].
#[derive(Debug)]
pub struct MemoryDriver {
    state: Arc<MemoryState>,
}

impl MemoryDriver {
    fn missing(table: &TableName) -> Error {
        Error::Database(format!("no such table: {table}"))
    }
}

impl TableDriver for MemoryDriver {
    fn table_exists(&mut self, table: &TableName) -> Result<bool> {
        Ok(self.state.tables.lock().contains_key(table.as_str()))
    }

    fn create_table(&mut self, table: &TableName) -> Result<()> {
        self.state
            .tables
            .lock()
            .entry(table.as_str().to_owned())
            .or_default();
        Ok(())
    }

    fn load_rows(&mut self, table: &TableName) -> Result<Vec<StoredRow>> {
        let tables = self.state.tables.lock();
        let rows = tables.get(table.as_str()).ok_or_else(|| Self::missing(table))?;
        Ok(rows
            .iter()
            .map(|(key, value)| StoredRow {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }

    fn upsert(&mut self, table: &TableName, key: &str, value: &str) -> Result<()> {
        let mut tables = self.state.tables.lock();
        let rows = tables
            .get_mut(table.as_str())
            .ok_or_else(|| Self::missing(table))?;
        rows.insert(key.to_owned(), Some(value.to_owned()));
        Ok(())
    }

    fn remove(&mut self, table: &TableName, key: &str) -> Result<usize> {
        let mut tables = self.state.tables.lock();
        let rows = tables
            .get_mut(table.as_str())
            .ok_or_else(|| Self::missing(table))?;
        Ok(usize::from(rows.remove(key).is_some()))
    }
}
