//! Per-character mood and trait overrides layered over a base profile.
//!
//! Overrides are stored as deltas in `[-1, 1]`, never as absolute values, so a
//! character's authored profile can change without invalidating saved state.
//! The record stays minimal: zero deltas, empty buckets, and characters with
//! nothing left are removed on every write.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::storage::{keys, load_or_default, save_record, KeyValueStore};

/// Which half of a profile a delta applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MindBucket {
    Moods,
    Traits,
}

impl MindBucket {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "moods" => Some(MindBucket::Moods),
            "traits" => Some(MindBucket::Traits),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MindBucket::Moods => "moods",
            MindBucket::Traits => "traits",
        }
    }
}

/// A character's profile: mood and trait intensities in `[0, 1]`.
///
/// Fields other than `moods` and `traits` are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MindProfile {
    #[serde(default)]
    pub moods: BTreeMap<String, f64>,
    #[serde(default)]
    pub traits: BTreeMap<String, f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Stored deltas for one character.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MindDeltas {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub moods: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub traits: BTreeMap<String, f64>,
}

impl MindDeltas {
    pub fn bucket(&self, bucket: MindBucket) -> &BTreeMap<String, f64> {
        match bucket {
            MindBucket::Moods => &self.moods,
            MindBucket::Traits => &self.traits,
        }
    }

    fn bucket_mut(&mut self, bucket: MindBucket) -> &mut BTreeMap<String, f64> {
        match bucket {
            MindBucket::Moods => &mut self.moods,
            MindBucket::Traits => &mut self.traits,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.moods.is_empty() && self.traits.is_empty()
    }
}

type OverrideRecord = BTreeMap<String, MindDeltas>;

/// Persisted overlay of mind deltas keyed by character id.
#[derive(Clone)]
pub struct MindOverrideStore {
    store: Rc<dyn KeyValueStore>,
}

impl MindOverrideStore {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn load(&self) -> OverrideRecord {
        load_or_default(self.store.as_ref(), keys::MIND_OVERRIDES)
    }

    fn save(&self, record: &OverrideRecord) {
        save_record(self.store.as_ref(), keys::MIND_OVERRIDES, record);
    }

    /// Stored deltas for a character, empty when none.
    pub fn overrides_for(&self, char_id: &str) -> MindDeltas {
        self.load().remove(char_id).unwrap_or_default()
    }

    /// Copy of `base` with the character's deltas applied and clamped to `[0, 1]`.
    ///
    /// A delta for a key missing from `base` applies on top of 0.0.
    pub fn merge_mind(&self, base: &MindProfile, char_id: &str) -> MindProfile {
        let mut merged = base.clone();
        let deltas = self.overrides_for(char_id);

        for (target, source) in [
            (&mut merged.moods, &deltas.moods),
            (&mut merged.traits, &deltas.traits),
        ] {
            for (key, delta) in source {
                let value = target.entry(key.clone()).or_insert(0.0);
                *value = (*value + delta).clamp(0.0, 1.0);
            }
        }

        merged
    }

    /// Accumulate `delta` into a character's stored override.
    ///
    /// The stored value is clamped to `[-1, 1]` and removed once it returns to
    /// exactly zero. Empty ids or keys and non-finite deltas are ignored.
    pub fn bump_mind(&self, char_id: &str, bucket: MindBucket, key: &str, delta: f64) {
        if char_id.is_empty() || key.is_empty() || !delta.is_finite() {
            tracing::debug!(char_id, key, delta, "Ignoring invalid mind bump");
            return;
        }

        let mut record = self.load();
        let deltas = record.entry(char_id.to_string()).or_default();
        let values = deltas.bucket_mut(bucket);

        let value = (values.get(key).copied().unwrap_or(0.0) + delta).clamp(-1.0, 1.0);
        if value == 0.0 {
            values.remove(key);
        } else {
            values.insert(key.to_string(), value);
        }

        if deltas.is_empty() {
            record.remove(char_id);
        }
        self.save(&record);
    }

    /// Clear one character's deltas, or every character's when `None`.
    pub fn reset_overrides(&self, char_id: Option<&str>) {
        match char_id {
            Some(id) => {
                let mut record = self.load();
                if record.remove(id).is_some() {
                    self.save(&record);
                }
            }
            None => self.save(&OverrideRecord::new()),
        }
    }
}
