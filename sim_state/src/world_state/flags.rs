//! Global flag set.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::storage::{keys, load_or_default, save_record, KeyValueStore};

/// Persisted set of boolean flags, stored as `{flag: true}`.
#[derive(Clone)]
pub struct FlagStore {
    store: Rc<dyn KeyValueStore>,
}

impl FlagStore {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn load(&self) -> BTreeMap<String, bool> {
        let mut flags: BTreeMap<String, bool> =
            load_or_default(self.store.as_ref(), keys::FLAGS);
        flags.retain(|_, set| *set);
        flags
    }

    fn save(&self, flags: &BTreeMap<String, bool>) {
        save_record(self.store.as_ref(), keys::FLAGS, flags);
    }

    pub fn is_set(&self, flag: &str) -> bool {
        self.load().contains_key(flag)
    }

    pub fn add(&self, flag: &str) {
        if flag.is_empty() {
            return;
        }
        let mut flags = self.load();
        if flags.insert(flag.to_string(), true).is_none() {
            self.save(&flags);
        }
    }

    pub fn remove(&self, flag: &str) {
        let mut flags = self.load();
        if flags.remove(flag).is_some() {
            self.save(&flags);
        }
    }

    /// All set flags in sorted order.
    pub fn all(&self) -> Vec<String> {
        self.load().into_keys().collect()
    }

    /// Set flags, read once for evaluating several conditions.
    pub fn snapshot(&self) -> BTreeSet<String> {
        self.load().into_keys().collect()
    }

    pub fn clear(&self) {
        self.save(&BTreeMap::new());
    }
}
