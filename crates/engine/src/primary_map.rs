//! The authoritative in-memory key -> value mapping.
//!
//! All mutations are point updates; the map never observes a
//! transitional state — `Engine` applies every pair of a bulk write
//! under the same guard acquisition that wrote the WAL record.

use std::collections::HashMap;

/// In-memory mapping from key to value. Keys are unique; no ordering
/// contract is exposed to clients.
#[derive(Debug, Default)]
pub struct PrimaryMap {
    entries: HashMap<String, String>,
}

impl PrimaryMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from an already-materialized snapshot or replay result.
    pub fn from_entries(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Current value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&String> {
        self.entries.get(key)
    }

    /// Insert or overwrite `key`.
    pub fn insert(&mut self, key: String, value: String) {
        self.entries.insert(key, value);
    }

    /// Remove `key`, returning whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Every key currently in the map, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Number of entries currently in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A deep copy suitable for passing to the checkpointer.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries.clone()
    }
}
