#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Text};
use persistmap::{PersistentMapStore, StoreOptions, ValueEncoding};
use serde_json::Value;
use tempfile::TempDir;

#[derive(QueryableByName)]
struct Count {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

#[derive(QueryableByName)]
struct RawValue {
    #[diesel(sql_type = Nullable<Text>)]
    value: Option<String>,
}

/// Temporary data directory for integration tests, removed on drop.
pub struct TempData {
    dir: TempDir,
}

impl TempData {
    pub fn create() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn database(&self) -> PathBuf {
        self.dir.path().join("enmap.sqlite")
    }

    pub fn options(&self, name: &str) -> StoreOptions {
        StoreOptions::new(name)
            .with_data_dir(self.dir.path())
            .with_connect_timeout(Duration::from_millis(500))
    }

    pub fn store(&self, name: &str, encoding: ValueEncoding) -> PersistentMapStore {
        PersistentMapStore::new(self.options(name).with_encoding(encoding)).expect("create store")
    }

    /// Initialize a store and return it together with the loaded map.
    pub async fn open(
        &self,
        name: &str,
        encoding: ValueEncoding,
    ) -> (PersistentMapStore, HashMap<String, Value>) {
        let store = self.store(name, encoding);
        let mut map = HashMap::new();
        store.init(&mut map).await.expect("init store");
        (store, map)
    }

    /// Load a fresh map from disk, closing the store afterwards.
    pub async fn reload(&self, name: &str, encoding: ValueEncoding) -> HashMap<String, Value> {
        let (store, map) = self.open(name, encoding).await;
        store.close().expect("close store");
        map
    }

    fn connection(&self) -> SqliteConnection {
        SqliteConnection::establish(&self.database().to_string_lossy())
            .expect("open sqlite database")
    }

    pub fn row_count(&self, table: &str) -> i64 {
        let mut conn = self.connection();
        diesel::sql_query(format!("SELECT count(*) AS count FROM \"{table}\""))
            .get_result::<Count>(&mut conn)
            .expect("count rows")
            .count
    }

    pub fn raw_value(&self, table: &str, key: &str) -> Option<Option<String>> {
        let mut conn = self.connection();
        diesel::sql_query(format!("SELECT value FROM \"{table}\" WHERE key = ?"))
            .bind::<Text, _>(key)
            .get_result::<RawValue>(&mut conn)
            .optional()
            .expect("query row")
            .map(|row| row.value)
    }

    pub fn table_exists(&self, table: &str) -> bool {
        if !self.database().exists() {
            return false;
        }
        let mut conn = self.connection();
        diesel::sql_query("SELECT count(*) AS count FROM sqlite_master WHERE type='table' AND name = ?")
            .bind::<Text, _>(table)
            .get_result::<Count>(&mut conn)
            .expect("query sqlite_master")
            .count
            > 0
    }

    /// Write a row directly, bypassing the store's encoding.
    pub fn insert_raw(&self, table: &str, key: &str, value: Option<&str>) {
        let mut conn = self.connection();
        diesel::sql_query(format!(
            "CREATE TABLE IF NOT EXISTS \"{table}\" (key TEXT PRIMARY KEY, value TEXT)"
        ))
        .execute(&mut conn)
        .expect("create table");
        diesel::sql_query(format!("INSERT OR REPLACE INTO \"{table}\" (key, value) VALUES (?, ?)"))
            .bind::<Text, _>(key)
            .bind::<Nullable<Text>, _>(value)
            .execute(&mut conn)
            .expect("insert raw row");
    }
}
