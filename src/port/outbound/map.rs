//! In-memory map port.
//!
//! The store never reads from the map; it only upserts loaded rows into it.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use dashmap::DashMap;
use serde_json::Value;

/// A mutable associative container that receives entries loaded from storage.
pub trait MapSink {
    /// Insert or replace the entry for `key`.
    fn insert_entry(&mut self, key: String, value: Value);
}

impl<S: BuildHasher> MapSink for HashMap<String, Value, S> {
    fn insert_entry(&mut self, key: String, value: Value) {
        self.insert(key, value);
    }
}

impl MapSink for BTreeMap<String, Value> {
    fn insert_entry(&mut self, key: String, value: Value) {
        self.insert(key, value);
    }
}

impl<S: BuildHasher + Clone> MapSink for DashMap<String, Value, S> {
    fn insert_entry(&mut self, key: String, value: Value) {
        self.insert(key, value);
    }
}
