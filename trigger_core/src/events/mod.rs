//! Gameplay events and the patterns rules use to select them.

mod bus;

pub use bus::*;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Something that just happened in play. Events are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Dotted event type, e.g. `interaction.kiss`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    /// Any further payload fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GameEvent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            location: None,
            witness: None,
            item: None,
            extra: Map::new(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_witness(mut self, witness: impl Into<String>) -> Self {
        self.witness = Some(witness.into());
        self
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Event selector in a rule. A trailing `.` makes it a namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventPattern {
    Exact(String),
    Namespace(String),
}

impl EventPattern {
    pub fn parse(pattern: &str) -> Self {
        Self::from(pattern.to_string())
    }

    pub fn matches(&self, kind: &str) -> bool {
        match self {
            EventPattern::Exact(expected) => expected == kind,
            EventPattern::Namespace(prefix) => kind.starts_with(prefix.as_str()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventPattern::Exact(s) | EventPattern::Namespace(s) => s,
        }
    }
}

impl From<String> for EventPattern {
    fn from(pattern: String) -> Self {
        if pattern.ends_with('.') {
            EventPattern::Namespace(pattern)
        } else {
            EventPattern::Exact(pattern)
        }
    }
}

impl From<EventPattern> for String {
    fn from(pattern: EventPattern) -> Self {
        match pattern {
            EventPattern::Exact(s) | EventPattern::Namespace(s) => s,
        }
    }
}

impl std::fmt::Display for EventPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
