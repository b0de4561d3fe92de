//! Persistent map store.
//!
//! Bridges an in-memory key-value map and a single table: [`init`] loads
//! every row into the caller's map, after which writes and deletes are
//! mirrored into the table.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──init──▶ Initializing ──ok──▶ Ready ──close──▶ Closed
//!       ▲                      │
//!       └────────error─────────┘
//! ```
//!
//! An `init` future dropped mid-load leaves the store `Initializing` until
//! the blocking load finishes, which then returns it to `Uninitialized`.
//! A retry therefore never opens a second connection alongside the first.
//!
//! The connection lives inside a mutex, so concurrent callers sharing one
//! store through an `Arc` are serialized statement by statement.
//!
//! [`init`]: PersistentMapStore::init

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::adapter::outbound::sqlite::SqliteConnector;
use crate::application::readiness::{ReadyLatch, Readiness};
use crate::domain::{MapKey, TableName, ValueEncoding};
use crate::error::{Error, Result, StateError};
use crate::infrastructure::config::{StoreOptions, DATABASE_FILE, DEFAULT_DATA_DIR};
use crate::port::{Connector, MapSink, TableDriver};

/// Snapshot of a store's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Uninitialized,
    Initializing,
    Ready,
    Closed,
}

enum Lifecycle<D> {
    Uninitialized,
    /// `abandoned` is set when the `init` future is dropped before the load finishes.
    Initializing { abandoned: bool },
    Ready(D),
    Closed,
}

impl<D> Lifecycle<D> {
    fn snapshot(&self) -> StoreState {
        match self {
            Self::Uninitialized => StoreState::Uninitialized,
            Self::Initializing { .. } => StoreState::Initializing,
            Self::Ready(_) => StoreState::Ready,
            Self::Closed => StoreState::Closed,
        }
    }

    /// Error for an operation that needs a ready connection.
    fn unavailable(&self) -> StateError {
        match self {
            Self::Closed => StateError::Closed,
            _ => StateError::NotInitialized,
        }
    }
}

struct Shared<C: Connector> {
    connector: C,
    table: TableName,
    encoding: ValueEncoding,
    state: Mutex<Lifecycle<C::Driver>>,
    ready: ReadyLatch,
}

impl<C: Connector> Shared<C> {
    fn begin_init(&self) -> Result<()> {
        let mut state = self.state.lock();
        match &*state {
            Lifecycle::Uninitialized => {
                *state = Lifecycle::Initializing { abandoned: false };
                Ok(())
            }
            Lifecycle::Closed => Err(StateError::Closed.into()),
            Lifecycle::Initializing { .. } | Lifecycle::Ready(_) => {
                Err(StateError::AlreadyInitialized.into())
            }
        }
    }

    /// Open the database, ensure the table, and decode every row.
    ///
    /// Nothing is returned unless all rows decode.
    fn open_and_load(&self, database: &Path) -> Result<(C::Driver, Vec<(String, Value)>)> {
        let mut driver = self.connector.connect(database)?;

        if !driver.table_exists(&self.table)? {
            driver.create_table(&self.table)?;
            info!(table = %self.table, path = %database.display(), "Created map table");
        }

        let entries = driver
            .load_rows(&self.table)?
            .into_iter()
            .map(|row| {
                let value = self.encoding.decode(&row.key, row.value.as_deref())?;
                Ok((row.key, value))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((driver, entries))
    }

    /// Run [`open_and_load`](Self::open_and_load) and settle the lifecycle.
    ///
    /// Leaves the store `Ready` on success, or `Uninitialized` on failure or
    /// when the waiting `init` was dropped in the meantime.
    fn load(&self, database: &Path) -> Result<Vec<(String, Value)>> {
        let loaded = self.open_and_load(database);

        let mut state = self.state.lock();
        let abandoned = matches!(*state, Lifecycle::Initializing { abandoned: true });
        match loaded {
            Ok((driver, entries)) if !abandoned => {
                *state = Lifecycle::Ready(driver);
                Ok(entries)
            }
            Ok((driver, _)) => {
                *state = Lifecycle::Uninitialized;
                drop(state);
                if let Err(e) = driver.close() {
                    debug!(table = %self.table, error = %e, "Failed to close abandoned connection");
                }
                warn!(table = %self.table, "Abandoned store initialization rolled back");
                Err(Error::Task("initialization abandoned".into()))
            }
            Err(e) => {
                *state = Lifecycle::Uninitialized;
                Err(e)
            }
        }
    }

    fn with_driver<T>(&self, op: impl FnOnce(&mut C::Driver) -> Result<T>) -> Result<T> {
        let mut state = self.state.lock();
        match &mut *state {
            Lifecycle::Ready(driver) => op(driver),
            other => Err(other.unavailable().into()),
        }
    }

    fn write(&self, key: &str, value: &Value) -> Result<()> {
        let encoded = self.encoding.encode(value)?;
        self.with_driver(|driver| driver.upsert(&self.table, key, &encoded))?;
        debug!(table = %self.table, key = %key, "Persisted entry");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let removed = self.with_driver(|driver| driver.remove(&self.table, key))?;
        debug!(table = %self.table, key = %key, removed, "Deleted entry");
        Ok(removed > 0)
    }
}

/// Handles an `init` future that is dropped before it finishes.
///
/// While the blocking load is still running the store stays `Initializing`
/// and is only flagged; [`Shared::load`] rolls it back once the connection
/// attempt is over. A load that already reached `Ready` is reset here.
struct InitGuard<'a, C: Connector> {
    shared: &'a Shared<C>,
    armed: bool,
}

impl<'a, C: Connector> InitGuard<'a, C> {
    fn new(shared: &'a Shared<C>) -> Self {
        Self {
            shared,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }

    /// Reset to `Uninitialized` after the load task itself died.
    fn rollback(mut self) {
        self.armed = false;
        *self.shared.state.lock() = Lifecycle::Uninitialized;
        warn!(table = %self.shared.table, "Store initialization rolled back");
    }
}

impl<C: Connector> Drop for InitGuard<'_, C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.shared.state.lock();
        if let Lifecycle::Initializing { abandoned } = &mut *state {
            *abandoned = true;
            debug!(table = %self.shared.table, "Store initialization abandoned while loading");
        } else if matches!(*state, Lifecycle::Ready(_)) {
            *state = Lifecycle::Uninitialized;
            warn!(table = %self.shared.table, "Store initialization rolled back");
        }
    }
}

/// SQLite-backed persistence for an in-memory key-value map.
///
/// # Example
///
/// ```no_run
/// use std::collections::HashMap;
///
/// use persistmap::{PersistentMapStore, StoreOptions};
/// use serde_json::{json, Value};
///
/// # async fn run() -> persistmap::Result<()> {
/// let store = PersistentMapStore::new(StoreOptions::new("Guild Settings"))?;
///
/// let mut map: HashMap<String, Value> = HashMap::new();
/// store.init(&mut map).await?.wait().await?;
///
/// store.set("prefix", &json!("!"))?;
/// store.set_async(42, &json!({"admins": [1, 2]})).await?;
/// store.delete("stale")?;
/// store.close()?;
/// # Ok(())
/// # }
/// ```
pub struct PersistentMapStore<C: Connector = SqliteConnector> {
    shared: Arc<Shared<C>>,
    data_dir: PathBuf,
    database_path: PathBuf,
}

impl PersistentMapStore<SqliteConnector> {
    /// Create a SQLite-backed store.
    ///
    /// No table is touched until [`init`](Self::init). When `data_dir` is not
    /// configured, `./data` is created if missing.
    ///
    /// # Errors
    /// Returns a configuration error if `name` is missing, or an IO error if
    /// the default data directory cannot be created.
    pub fn new(options: StoreOptions) -> Result<Self> {
        let connector = SqliteConnector::from_options(&options);
        Self::with_connector(options, connector)
    }
}

impl<C: Connector> PersistentMapStore<C> {
    /// Create a store that opens its database through `connector`.
    ///
    /// # Errors
    /// Same as [`PersistentMapStore::new`].
    pub fn with_connector(options: StoreOptions, connector: C) -> Result<Self> {
        options.validate()?;
        let table = TableName::from_logical(options.require_name()?);
        let data_dir = resolve_data_dir(options.data_dir.as_deref())?;
        let database_path = data_dir.join(DATABASE_FILE);

        debug!(table = %table, path = %database_path.display(), "Created map store");

        Ok(Self {
            shared: Arc::new(Shared {
                connector,
                table,
                encoding: options.encoding,
                state: Mutex::new(Lifecycle::Uninitialized),
                ready: ReadyLatch::new(),
            }),
            data_dir,
            database_path,
        })
    }

    /// Load every stored row into `target` and resolve the readiness signal.
    ///
    /// Loading is all-or-nothing: `target` is only written once every row
    /// has decoded. On failure the store returns to `Uninitialized` and
    /// `init` may be retried.
    ///
    /// If this future is dropped while the database is still being opened,
    /// the store reports `Initializing` until that blocking load ends and
    /// only then returns to `Uninitialized`.
    ///
    /// # Errors
    /// - [`StateError::AlreadyInitialized`] if `init` already ran or is running
    /// - [`StateError::Closed`] after [`close`](Self::close)
    /// - a connection or database error if the file cannot be opened or read
    /// - [`Error::Decode`] if a stored value does not decode
    pub async fn init<M>(&self, target: &mut M) -> Result<Readiness>
    where
        M: MapSink + ?Sized,
    {
        self.shared.begin_init()?;
        let guard = InitGuard::new(&self.shared);

        let shared = Arc::clone(&self.shared);
        let database = self.database_path.clone();
        let entries = match tokio::task::spawn_blocking(move || shared.load(&database)).await {
            Ok(Ok(entries)) => entries,
            Ok(Err(e)) => {
                guard.disarm();
                warn!(table = %self.shared.table, error = %e, "Failed to load map table");
                return Err(e);
            }
            Err(e) => {
                guard.rollback();
                return Err(Error::from(e));
            }
        };
        guard.disarm();

        let rows = entries.len();
        for (key, value) in entries {
            target.insert_entry(key, value);
        }
        self.shared.ready.resolve();

        info!(table = %self.shared.table, rows, "Map store ready");
        Ok(self.readiness())
    }

    /// Upsert `key` with `value`, blocking until the write completes.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] for an empty key, [`Error::Json`] if the
    /// value cannot be serialized, a state error unless the store is ready,
    /// or a database error if the statement fails.
    pub fn set<K, V>(&self, key: K, value: &V) -> Result<()>
    where
        K: Into<MapKey>,
        V: Serialize + ?Sized,
    {
        let key = key.into().to_column()?;
        let value = serde_json::to_value(value)?;
        self.shared.write(&key, &value)
    }

    /// Upsert `key` with `value` on the blocking pool.
    ///
    /// Produces the same row as [`set`](Self::set).
    ///
    /// # Errors
    /// Same as [`set`](Self::set).
    pub async fn set_async<K, V>(&self, key: K, value: &V) -> Result<()>
    where
        K: Into<MapKey>,
        V: Serialize + ?Sized,
    {
        let key = key.into().to_column()?;
        let value = serde_json::to_value(value)?;
        let shared = Arc::clone(&self.shared);
        tokio::task::spawn_blocking(move || shared.write(&key, &value)).await?
    }

    /// Remove the row for `key`. Removing an absent key is not an error.
    ///
    /// Returns whether a row was removed.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] for an empty key, a state error unless
    /// the store is ready, or a database error if the statement fails.
    pub fn delete<K: Into<MapKey>>(&self, key: K) -> Result<bool> {
        let key = key.into().to_column()?;
        self.shared.remove(&key)
    }

    /// Remove the row for `key` on the blocking pool.
    ///
    /// # Errors
    /// Same as [`delete`](Self::delete).
    pub async fn delete_async<K: Into<MapKey>>(&self, key: K) -> Result<bool> {
        let key = key.into().to_column()?;
        let shared = Arc::clone(&self.shared);
        tokio::task::spawn_blocking(move || shared.remove(&key)).await?
    }

    /// Release the database connection. The store cannot be reopened.
    ///
    /// # Errors
    /// Returns [`StateError::NotInitialized`] before a successful `init` and
    /// [`StateError::Closed`] if already closed.
    pub fn close(&self) -> Result<()> {
        let driver = {
            let mut state = self.shared.state.lock();
            match std::mem::replace(&mut *state, Lifecycle::Closed) {
                Lifecycle::Ready(driver) => driver,
                other => {
                    let err = other.unavailable();
                    *state = other;
                    return Err(err.into());
                }
            }
        };

        driver.close()?;
        info!(table = %self.shared.table, "Map store closed");
        Ok(())
    }

    /// Handle on the one-shot readiness signal.
    #[must_use]
    pub fn readiness(&self) -> Readiness {
        self.shared.ready.subscribe()
    }

    /// Whether `init` has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.readiness().is_ready()
    }

    #[must_use]
    pub fn state(&self) -> StoreState {
        self.shared.state.lock().snapshot()
    }

    /// Sanitized table name this store reads and writes.
    #[must_use]
    pub fn table_name(&self) -> &TableName {
        &self.shared.table
    }

    #[must_use]
    pub fn encoding(&self) -> ValueEncoding {
        self.shared.encoding
    }

    /// Absolute data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the shared database file inside the data directory.
    #[must_use]
    pub fn database_path(&self) -> &Path {
        &self.database_path
    }
}

fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    match explicit {
        Some(dir) => Ok(cwd.join(dir)),
        None => {
            let dir = cwd.join(DEFAULT_DATA_DIR);
            if !dir.exists() {
                fs::create_dir_all(&dir)?;
                info!(path = %dir.display(), "Created default data directory");
            }
            Ok(dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use serde_json::json;

    use super::*;
    use crate::error::ConfigError;
    use crate::testkit::MemoryConnector;

    fn store(connector: &MemoryConnector, encoding: ValueEncoding) -> PersistentMapStore<MemoryConnector> {
        let options = StoreOptions::new("My Map!")
            .with_data_dir(std::env::temp_dir())
            .with_encoding(encoding);
        PersistentMapStore::with_connector(options, connector.clone()).unwrap()
    }

    async fn ready_store(connector: &MemoryConnector) -> PersistentMapStore<MemoryConnector> {
        let store = store(connector, ValueEncoding::Json);
        let mut map: HashMap<String, Value> = HashMap::new();
        store.init(&mut map).await.unwrap();
        store
    }

    #[test]
    fn construction_requires_name() {
        let result = PersistentMapStore::with_connector(
            StoreOptions::default().with_data_dir(std::env::temp_dir()),
            MemoryConnector::new(),
        );
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingField { field: "name" }))
        ));
    }

    #[test]
    fn construction_does_not_touch_storage() {
        let connector = MemoryConnector::new();
        let store = store(&connector, ValueEncoding::Json);

        assert_eq!(store.table_name().as_str(), "my_map_");
        assert_eq!(store.state(), StoreState::Uninitialized);
        assert_eq!(connector.connect_count(), 0);
        assert!(!connector.has_table("my_map_"));
    }

    #[test]
    fn database_path_is_inside_data_dir() {
        let store = store(&MemoryConnector::new(), ValueEncoding::Json);
        assert_eq!(store.database_path(), std::env::temp_dir().join("enmap.sqlite"));
        assert!(store.data_dir().is_absolute());
    }

    #[test]
    fn operations_before_init_fail() {
        let store = store(&MemoryConnector::new(), ValueEncoding::Json);

        assert!(matches!(
            store.set("a", &1),
            Err(Error::State(StateError::NotInitialized))
        ));
        assert!(matches!(
            store.delete("a"),
            Err(Error::State(StateError::NotInitialized))
        ));
        assert!(matches!(
            store.close(),
            Err(Error::State(StateError::NotInitialized))
        ));
        assert_eq!(store.state(), StoreState::Uninitialized);
    }

    #[tokio::test]
    async fn init_creates_table_and_loads_rows() {
        let connector = MemoryConnector::new();
        connector.insert_raw("my_map_", "a", Some("1"));
        connector.insert_raw("my_map_", "b", Some(r#"{"x":[true]}"#));
        let store = store(&connector, ValueEncoding::Json);

        let readiness = store.readiness();
        assert!(!readiness.is_ready());

        let mut map: BTreeMap<String, Value> = BTreeMap::new();
        store.init(&mut map).await.unwrap().wait().await.unwrap();

        assert!(readiness.is_ready());
        assert!(store.is_ready());
        assert_eq!(store.state(), StoreState::Ready);
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], json!(1));
        assert_eq!(map["b"], json!({"x": [true]}));
    }

    #[tokio::test]
    async fn init_creates_missing_table() {
        let connector = MemoryConnector::new();
        let _store = ready_store(&connector).await;
        assert!(connector.has_table("my_map_"));
        assert_eq!(connector.row_count("my_map_"), 0);
    }

    #[tokio::test]
    async fn second_init_is_rejected() {
        let connector = MemoryConnector::new();
        let store = ready_store(&connector).await;

        let mut map: HashMap<String, Value> = HashMap::new();
        assert!(matches!(
            store.init(&mut map).await,
            Err(Error::State(StateError::AlreadyInitialized))
        ));
        assert_eq!(connector.connect_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_init_is_rejected() {
        let connector = MemoryConnector::new();
        let store = store(&connector, ValueEncoding::Json);
        let mut first: HashMap<String, Value> = HashMap::new();
        let mut second: HashMap<String, Value> = HashMap::new();

        let (a, b) = tokio::join!(store.init(&mut first), store.init(&mut second));

        assert!(a.is_ok());
        assert!(matches!(b, Err(Error::State(StateError::AlreadyInitialized))));
    }

    #[tokio::test]
    async fn failed_connect_rolls_back_and_allows_retry() {
        let connector = MemoryConnector::new();
        connector.refuse_connections(true);
        let store = store(&connector, ValueEncoding::Json);
        let mut map: HashMap<String, Value> = HashMap::new();

        let err = store.init(&mut map).await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
        assert_eq!(store.state(), StoreState::Uninitialized);
        assert!(!store.is_ready());

        connector.refuse_connections(false);
        store.init(&mut map).await.unwrap();
        assert_eq!(store.state(), StoreState::Ready);
    }

    #[tokio::test]
    async fn decode_failure_leaves_map_untouched() {
        let connector = MemoryConnector::new();
        connector.insert_raw("my_map_", "a", Some("[1]"));
        connector.insert_raw("my_map_", "b", Some("{broken"));
        connector.insert_raw("my_map_", "c", Some("\"fine\""));
        let store = store(&connector, ValueEncoding::Sniffed);

        let mut map: BTreeMap<String, Value> = BTreeMap::new();
        let err = store.init(&mut map).await.unwrap_err();

        match err {
            Error::Decode { key, .. } => assert_eq!(key, "b"),
            other => panic!("expected decode error, got {other:?}"),
        }
        assert!(map.is_empty());
        assert_eq!(store.state(), StoreState::Uninitialized);
    }

    #[tokio::test]
    async fn set_and_delete_mirror_into_table() {
        let connector = MemoryConnector::new();
        let store = ready_store(&connector).await;

        store.set("a", &json!({"n": 1})).unwrap();
        store.set(7, &"seven").unwrap();
        store.set_async("b", &[1, 2, 3]).await.unwrap();

        assert_eq!(connector.raw_value("my_map_", "a"), Some(Some(r#"{"n":1}"#.into())));
        assert_eq!(connector.raw_value("my_map_", "7"), Some(Some("\"seven\"".into())));
        assert_eq!(connector.raw_value("my_map_", "b"), Some(Some("[1,2,3]".into())));

        assert!(store.delete("a").unwrap());
        assert!(store.delete_async(7).await.unwrap());
        assert!(!store.delete("missing").unwrap());
        assert_eq!(connector.row_count("my_map_"), 1);
    }

    #[tokio::test]
    async fn invalid_keys_are_rejected_before_writing() {
        let connector = MemoryConnector::new();
        let store = ready_store(&connector).await;

        assert!(matches!(store.set("", &1), Err(Error::InvalidKey { .. })));
        assert!(matches!(
            store.set_async("", &1).await,
            Err(Error::InvalidKey { .. })
        ));
        assert!(matches!(store.delete(""), Err(Error::InvalidKey { .. })));

        let key = MapKey::try_from(&json!([1])).unwrap_err();
        assert!(matches!(key, Error::InvalidKey { .. }));
        assert_eq!(connector.row_count("my_map_"), 0);
    }

    #[tokio::test]
    async fn close_is_terminal() {
        let connector = MemoryConnector::new();
        let store = ready_store(&connector).await;

        store.close().unwrap();
        assert_eq!(store.state(), StoreState::Closed);

        let closed = |r: Result<()>| matches!(r, Err(Error::State(StateError::Closed)));
        assert!(closed(store.set("a", &1)));
        assert!(closed(store.set_async("a", &1).await));
        assert!(closed(store.delete("a").map(|_| ())));
        assert!(closed(store.delete_async("a").await.map(|_| ())));
        assert!(closed(store.close()));

        let mut map: HashMap<String, Value> = HashMap::new();
        assert!(closed(store.init(&mut map).await.map(|_| ())));
    }

    #[tokio::test]
    async fn readiness_stays_resolved_after_close() {
        let store = ready_store(&MemoryConnector::new()).await;
        let readiness = store.readiness();
        store.close().unwrap();
        assert!(readiness.wait().await.is_ok());
    }

    #[tokio::test]
    async fn shared_store_serializes_concurrent_writes() {
        let connector = MemoryConnector::new();
        let store = Arc::new(ready_store(&connector).await);

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.set_async(format!("k{i}"), &i).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(connector.row_count("my_map_"), 32);
    }
}
