//! Cooldown expiry timestamps.
//!
//! Expiry is checked lazily against the caller's wall-clock time; nothing is
//! scheduled.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::storage::{keys, load_or_default, save_record, KeyValueStore};

/// Persisted map of cooldown id to expiry in epoch milliseconds.
#[derive(Clone)]
pub struct CooldownStore {
    store: Rc<dyn KeyValueStore>,
}

impl CooldownStore {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn load(&self) -> BTreeMap<String, i64> {
        load_or_default(self.store.as_ref(), keys::COOLDOWNS)
    }

    fn save(&self, cooldowns: &BTreeMap<String, i64>) {
        save_record(self.store.as_ref(), keys::COOLDOWNS, cooldowns);
    }

    /// Whether `id` has an expiry later than `now_ms`.
    pub fn is_active(&self, id: &str, now_ms: i64) -> bool {
        self.expiry(id).is_some_and(|expires| expires > now_ms)
    }

    pub fn expiry(&self, id: &str) -> Option<i64> {
        self.load().get(id).copied()
    }

    /// Block `id` until `now_ms + duration_ms`. Expired entries are dropped
    /// while the record is rewritten.
    pub fn arm(&self, id: &str, duration_ms: i64, now_ms: i64) {
        if id.is_empty() || duration_ms <= 0 {
            tracing::debug!(id, duration_ms, "Ignoring cooldown without id or duration");
            return;
        }

        let mut cooldowns = self.load();
        cooldowns.retain(|_, expires| *expires > now_ms);
        cooldowns.insert(id.to_string(), now_ms.saturating_add(duration_ms));
        self.save(&cooldowns);
    }

    pub fn clear(&self, id: &str) {
        let mut cooldowns = self.load();
        if cooldowns.remove(id).is_some() {
            self.save(&cooldowns);
        }
    }

    pub fn clear_all(&self) {
        self.save(&BTreeMap::new());
    }
}
