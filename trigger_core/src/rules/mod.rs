//! Trigger rules - externally authored, data-driven reactions to events.
//!
//! A rule document is plain JSON and is the contract designers author
//! against, so every type here serializes back to the shape it was read from:
//! numbers keep their written form and unrecognized keys are carried along.

mod action;
mod gates;
mod number;

pub use action::*;
pub use gates::*;
pub use number::RuleNumber;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::events::EventPattern;

/// Rule document could not be decoded.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Invalid rule document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Rule document must be an array or an object with a `rules` array")]
    Shape,
}

/// One trigger rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRule {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    pub event: EventPattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<RuleWhen>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<FlagGate>,
    /// Probability in `[0, 1]` that a matching event fires the rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chance: Option<RuleNumber>,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<PayloadMatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_ms: Option<RuleNumber>,
    pub actions: Vec<RuleAction>,
    /// Keys the engine does not read, such as designer notes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TriggerRule {
    pub fn new(id: impl Into<String>, event: &str) -> Self {
        Self {
            id: id.into(),
            disabled: None,
            event: EventPattern::parse(event),
            when: None,
            flags: None,
            chance: None,
            payload: None,
            cooldown_id: None,
            cooldown_ms: None,
            actions: Vec::new(),
            extra: Map::new(),
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(RuleAction::from(action));
        self
    }

    pub fn with_cooldown(mut self, id: impl Into<String>, ms: i64) -> Self {
        self.cooldown_id = Some(id.into());
        self.cooldown_ms = Some(ms.into());
        self
    }

    /// A non-finite `chance` leaves the rule ungated.
    pub fn with_chance(mut self, chance: f64) -> Self {
        self.chance = RuleNumber::float(chance);
        self
    }

    pub fn with_flags(mut self, flags: FlagGate) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn with_when(mut self, when: RuleWhen) -> Self {
        self.when = Some(when);
        self
    }

    pub fn with_payload(mut self, payload: PayloadMatch) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.unwrap_or(false)
    }

    pub fn chance(&self) -> Option<f64> {
        self.chance.as_ref().map(RuleNumber::as_f64)
    }

    /// Cooldown armed after the rule fires, when both id and duration are set.
    pub fn cooldown(&self) -> Option<(&str, i64)> {
        let ms = self.cooldown_ms.as_ref()?.as_i64()?;
        Some((self.cooldown_id.as_deref()?, ms))
    }
}

/// Problem found in one entry of a rule document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleIssue {
    /// Position in the rules array.
    pub index: usize,
    pub rule_id: Option<String>,
    pub message: String,
}

impl std::fmt::Display for RuleIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.rule_id {
            Some(id) => write!(f, "rule #{} ({}): {}", self.index, id, self.message),
            None => write!(f, "rule #{}: {}", self.index, self.message),
        }
    }
}

/// Decoded rules plus everything that was skipped on the way.
#[derive(Debug, Clone, Default)]
pub struct LoadedRules {
    pub rules: Vec<TriggerRule>,
    pub issues: Vec<RuleIssue>,
}

/// Decode each rule of a document on its own.
///
/// Only an unreadable document or one of the wrong shape is an error. A rule
/// that fails to decode is left out and reported; so is every action the
/// engine will skip, while its rule is kept.
pub fn decode_rules(source: &str) -> Result<LoadedRules, RuleError> {
    let document: Value = serde_json::from_str(source)?;
    let list = match document {
        Value::Array(list) => list,
        Value::Object(mut map) => match map.remove("rules") {
            Some(Value::Array(list)) => list,
            _ => return Err(RuleError::Shape),
        },
        _ => return Err(RuleError::Shape),
    };

    let mut loaded = LoadedRules::default();
    for (index, entry) in list.into_iter().enumerate() {
        let rule_id = entry.get("id").and_then(Value::as_str).map(str::to_string);
        let rule = match TriggerRule::deserialize(&entry) {
            Ok(rule) => rule,
            Err(e) => {
                loaded.issues.push(RuleIssue {
                    index,
                    rule_id,
                    message: e.to_string(),
                });
                continue;
            }
        };

        for action in rule.actions.iter().filter(|a| a.known().is_none()) {
            let message = match action.type_name() {
                Some(name) if action.is_malformed() => format!("malformed `{name}` action will be ignored"),
                Some(name) => format!("unrecognized action `{name}` will be ignored"),
                None => "action without a `type` will be ignored".to_string(),
            };
            loaded.issues.push(RuleIssue {
                index,
                rule_id: Some(rule.id.clone()),
                message,
            });
        }
        if rule.cooldown_ms.is_some() && rule.cooldown().is_none() {
            loaded.issues.push(RuleIssue {
                index,
                rule_id: Some(rule.id.clone()),
                message: "cooldownMs is out of range or has no cooldownId".to_string(),
            });
        }
        loaded.rules.push(rule);
    }
    Ok(loaded)
}

/// Decode rules from a JSON array or an object with a `rules` array, logging
/// every [`RuleIssue`] and returning the rules that decoded.
pub fn load_rules(source: &str) -> Result<Vec<TriggerRule>, RuleError> {
    let loaded = decode_rules(source)?;
    for issue in &loaded.issues {
        tracing::warn!(
            index = issue.index,
            rule = issue.rule_id.as_deref().unwrap_or("<unnamed>"),
            "{}",
            issue.message
        );
    }
    tracing::debug!(
        count = loaded.rules.len(),
        issues = loaded.issues.len(),
        "Loaded trigger rules"
    );
    Ok(loaded.rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_rule_json() -> Value {
        json!({
            "id": "first-kiss",
            "description": "designer note",
            "event": "interaction.",
            "when": {
                "time": {"hourMin": 18, "hourMax": 23},
                "pathStage": {"pathIn": ["romance"], "stageMin": 3}
            },
            "flags": {"requireAll": ["met"], "forbid": ["kissed"]},
            "chance": 1,
            "match": {"locationIn": ["pier"], "witnessIn": ["innkeeper"]},
            "cooldownId": "kiss",
            "cooldownMs": 3600000,
            "actions": [
                {"type": "diary.append", "text": "Under the lanterns.", "tags": ["kiss"]},
                {"type": "stage.add", "delta": 1},
                {"type": "flag.add", "flag": "kissed", "note": "why"},
                {"type": "sfx.play", "clip": "chime"}
            ]
        })
    }

    #[test]
    fn test_rule_round_trips_unchanged() {
        let raw = full_rule_json();
        let rule: TriggerRule = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(rule.event, EventPattern::Namespace("interaction.".to_string()));
        assert_eq!(rule.cooldown(), Some(("kiss", 3_600_000)));
        assert_eq!(rule.chance(), Some(1.0));
        assert_eq!(rule.extra["description"], "designer note");
        assert_eq!(
            rule.actions[2].known(),
            Some(&Action::FlagAdd {
                flag: "kissed".to_string()
            })
        );
        assert!(rule.actions[3].known().is_none());

        let back = serde_json::to_value(&rule).unwrap();
        assert_eq!(back["chance"], json!(1));
        assert!(back["chance"].is_u64());
        assert_eq!(back, raw);
    }

    #[test]
    fn test_minimal_rule_round_trips() {
        let raw = json!({"id": "r", "event": "quest.done", "actions": []});
        let rule: TriggerRule = serde_json::from_value(raw.clone()).unwrap();
        assert!(!rule.is_disabled());
        assert!(rule.cooldown().is_none());
        assert!(rule.chance().is_none());
        assert_eq!(serde_json::to_value(&rule).unwrap(), raw);
    }

    #[test]
    fn test_float_numbers_accepted() {
        let source = json!([{
            "id": "r",
            "event": "talk",
            "chance": 0.5,
            "cooldownId": "k",
            "cooldownMs": 1500.0,
            "actions": [{"type": "stage.add", "delta": 1.0}]
        }])
        .to_string();

        let loaded = decode_rules(&source).unwrap();
        assert!(loaded.issues.is_empty());
        let rule = &loaded.rules[0];
        assert_eq!(rule.cooldown(), Some(("k", 1500)));
        assert_eq!(rule.actions[0].known(), Some(&Action::StageAdd { delta: 1 }));
        assert_eq!(serde_json::to_value(rule).unwrap()["cooldownMs"], json!(1500.0));
    }

    #[test]
    fn test_load_rules_array_and_wrapped() {
        let list = json!([{"id": "a", "event": "x", "actions": []}]).to_string();
        assert_eq!(load_rules(&list).unwrap().len(), 1);

        let wrapped = json!({"rules": [
            {"id": "a", "event": "x", "actions": []},
            {"id": "b", "event": "y.", "disabled": true, "actions": []}
        ]})
        .to_string();
        let rules = load_rules(&wrapped).unwrap();
        assert_eq!(rules.len(), 2);
        assert!(rules[1].is_disabled());
    }

    #[test]
    fn test_load_rules_errors() {
        assert!(matches!(load_rules("{"), Err(RuleError::Json(_))));
        assert!(matches!(load_rules("42"), Err(RuleError::Shape)));
        assert!(matches!(load_rules(r#"{"other": []}"#), Err(RuleError::Shape)));
        assert!(matches!(load_rules(r#"{"rules": {}}"#), Err(RuleError::Shape)));
    }

    #[test]
    fn test_bad_rule_skipped_and_reported() {
        let source = json!([
            {"event": "x", "actions": []},
            {"id": "slow", "event": "x", "cooldownId": "k", "cooldownMs": "soon", "actions": []},
            {"id": "good", "event": "x", "actions": [
                {"type": "stage.add", "delta": "lots"},
                {"type": "camera.shake"},
                {"flag": "orphan"}
            ]}
        ])
        .to_string();

        let loaded = decode_rules(&source).unwrap();
        assert_eq!(loaded.rules.len(), 1);
        assert_eq!(loaded.rules[0].id, "good");

        let summary: Vec<(usize, Option<&str>)> = loaded
            .issues
            .iter()
            .map(|i| (i.index, i.rule_id.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (0, None),
                (1, Some("slow")),
                (2, Some("good")),
                (2, Some("good")),
                (2, Some("good")),
            ]
        );
        assert!(loaded.issues[2].message.contains("malformed `stage.add`"));
        assert!(loaded.issues[3].message.contains("unrecognized action `camera.shake`"));
        assert!(loaded.issues[1].to_string().starts_with("rule #1 (slow)"));

        assert_eq!(load_rules(&source).unwrap().len(), 1);
    }

    #[test]
    fn test_builder_matches_document() {
        let rule = TriggerRule::new("gift", "interaction.gift")
            .with_action(Action::FlagAdd {
                flag: "gifted".to_string(),
            })
            .with_cooldown("gift", 1000);

        let expected: TriggerRule = serde_json::from_value(json!({
            "id": "gift",
            "event": "interaction.gift",
            "cooldownId": "gift",
            "cooldownMs": 1000,
            "actions": [{"type": "flag.add", "flag": "gifted"}]
        }))
        .unwrap();
        assert_eq!(rule, expected);
    }
}
