//! Rule actions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::number::{de_whole, de_whole_opt};

/// Highest stage a pair can reach through `stage.add`.
pub const MAX_STAGE: i32 = 10;

/// Payload of a `diary.append` action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryAppend {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Looked up through the diary's event lines when `text` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "de_whole_opt")]
    pub stage: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Also record the event's witness as having seen the pair.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_witness: Option<bool>,
}

/// A decoded action, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    #[serde(rename = "diary.append")]
    DiaryAppend(DiaryAppend),

    /// Overwrite the pair path; keeps the current path when absent.
    #[serde(rename = "path.set")]
    PathSet {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },

    /// Signed stage change, clamped to `[0, MAX_STAGE]`.
    #[serde(rename = "stage.add")]
    StageAdd {
        #[serde(deserialize_with = "de_whole")]
        delta: i32,
    },

    #[serde(rename = "flag.add")]
    FlagAdd { flag: String },

    #[serde(rename = "flag.remove")]
    FlagRemove { flag: String },

    #[serde(rename = "cooldown")]
    ArmCooldown {
        id: String,
        #[serde(deserialize_with = "de_whole")]
        ms: i64,
    },
}

impl Action {
    /// Every `type` tag the engine executes.
    pub const TYPES: [&'static str; 6] = [
        "diary.append",
        "path.set",
        "stage.add",
        "flag.add",
        "flag.remove",
        "cooldown",
    ];

    pub fn type_name(&self) -> &'static str {
        match self {
            Action::DiaryAppend(_) => "diary.append",
            Action::PathSet { .. } => "path.set",
            Action::StageAdd { .. } => "stage.add",
            Action::FlagAdd { .. } => "flag.add",
            Action::FlagRemove { .. } => "flag.remove",
            Action::ArmCooldown { .. } => "cooldown",
        }
    }
}

/// An entry of a rule's `actions` array.
///
/// The entry is kept verbatim next to its decoded form, so a rule document
/// serializes back unchanged, fields the engine does not read included.
/// Entries that do not decode as an [`Action`] are skipped by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleAction {
    raw: Value,
    action: Option<Action>,
}

impl RuleAction {
    pub fn from_raw(raw: Value) -> Self {
        let action = Action::deserialize(&raw).ok();
        Self { raw, action }
    }

    pub fn known(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The `type` tag, if any.
    pub fn type_name(&self) -> Option<&str> {
        self.raw.get("type").and_then(Value::as_str)
    }

    /// A recognized `type` whose fields failed to decode.
    pub fn is_malformed(&self) -> bool {
        self.action.is_none() && self.type_name().is_some_and(|t| Action::TYPES.contains(&t))
    }
}

impl From<Action> for RuleAction {
    fn from(action: Action) -> Self {
        let raw = serde_json::to_value(&action).unwrap_or_default();
        Self {
            raw,
            action: Some(action),
        }
    }
}

impl Serialize for RuleAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RuleAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_raw)
    }
}
