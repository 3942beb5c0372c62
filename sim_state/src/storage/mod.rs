//! Key-value persistence capability shared by every persisted store.
//!
//! Each store owns one JSON record under its own versioned key and performs a
//! plain read-modify-write per operation. There are no transactions: two
//! writers racing on the same key resolve as last-write-wins.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;

/// Record keys.
pub mod keys {
    pub const CLOCK: &str = "sim.clock.v1";
    pub const COOLDOWNS: &str = "sim.cooldowns.v1";
    pub const FLAGS: &str = "sim.flags.v1";
    pub const MIND_OVERRIDES: &str = "sim.mind_overrides.v1";
}

/// Synchronous string storage keyed by name.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
}

/// In-process store, used for tests and for sessions that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a key, returning its raw value.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.borrow_mut().remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries.borrow_mut().insert(key.to_string(), value);
    }
}

/// Read a JSON record, returning `None` when it is missing or corrupt.
pub fn load_record<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding corrupt record");
            None
        }
    }
}

/// Read a JSON record or fall back to the type's default.
pub fn load_or_default<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    load_record(store, key).unwrap_or_default()
}

/// Write a JSON record.
pub fn save_record<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => store.set(key, json),
        Err(e) => tracing::error!(key, error = %e, "Failed to encode record"),
    }
}
