//! Gate blocks of a trigger rule and their predicates.
//!
//! Each block keeps unrecognized keys in `extra` so it serializes back as
//! authored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::number::{whole_or, RuleNumber};
use crate::diary::PairState;
use crate::events::GameEvent;

/// `when` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleWhen {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_stage: Option<PathStageGate>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Inclusive hour and day ranges on the game clock.
///
/// An hour range whose minimum exceeds its maximum wraps past midnight, so
/// `hourMin: 22, hourMax: 3` covers late night.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour_min: Option<RuleNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour_max: Option<RuleNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_min: Option<RuleNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_max: Option<RuleNumber>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TimeWindow {
    pub fn hours(hour_min: i64, hour_max: i64) -> Self {
        Self {
            hour_min: Some(hour_min.into()),
            hour_max: Some(hour_max.into()),
            ..Default::default()
        }
    }

    pub fn with_days(mut self, day_min: Option<i64>, day_max: Option<i64>) -> Self {
        self.day_min = day_min.map(RuleNumber::from);
        self.day_max = day_max.map(RuleNumber::from);
        self
    }

    pub fn contains(&self, hour: u8, day: u32) -> bool {
        let hour = i64::from(hour);
        let day = i64::from(day);

        let hour_min = whole_or(&self.hour_min, 0);
        let hour_max = whole_or(&self.hour_max, 23);
        let hour_ok = if hour_min <= hour_max {
            (hour_min..=hour_max).contains(&hour)
        } else {
            hour >= hour_min || hour <= hour_max
        };

        let day_ok = (whole_or(&self.day_min, 1)..=whole_or(&self.day_max, i64::MAX)).contains(&day);
        hour_ok && day_ok
    }
}

/// Requirements on the pair's narrative path and stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStageGate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_in: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_min: Option<RuleNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_max: Option<RuleNumber>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PathStageGate {
    pub fn admits(&self, pair: &PairState) -> bool {
        if let Some(paths) = &self.path_in {
            if !paths.iter().any(|p| *p == pair.path) {
                return false;
            }
        }
        (whole_or(&self.stage_min, 0)..=whole_or(&self.stage_max, 999)).contains(&i64::from(pair.stage))
    }
}

/// Flag requirements. An empty `requireAny` list imposes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagGate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_all: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_any: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forbid: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlagGate {
    pub fn admits(&self, is_set: impl Fn(&str) -> bool) -> bool {
        let all = self.require_all.as_deref().unwrap_or_default();
        let any = self.require_any.as_deref().unwrap_or_default();
        let forbid = self.forbid.as_deref().unwrap_or_default();

        all.iter().all(|f| is_set(f))
            && (any.is_empty() || any.iter().any(|f| is_set(f)))
            && !forbid.iter().any(|f| is_set(f))
    }
}

/// Allow-lists on event payload fields. A listed field must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_in: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness_in: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_in: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PayloadMatch {
    pub fn admits(&self, event: &GameEvent) -> bool {
        allowed(&self.location_in, &event.location)
            && allowed(&self.witness_in, &event.witness)
            && allowed(&self.item_in, &event.item)
    }
}

fn allowed(list: &Option<Vec<String>>, value: &Option<String>) -> bool {
    match (list, value) {
        (None, _) => true,
        (Some(list), Some(value)) => list.iter().any(|v| v == value),
        (Some(_), None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(items: &[&str]) -> Option<Vec<String>> {
        Some(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_time_window_defaults_cover_everything() {
        let window = TimeWindow::default();
        assert!(window.contains(0, 1));
        assert!(window.contains(23, 10_000));
    }

    #[test]
    fn test_time_window_ranges() {
        let window = TimeWindow::hours(9, 17).with_days(Some(2), Some(4));
        assert!(window.contains(9, 2));
        assert!(window.contains(17, 4));
        assert!(!window.contains(8, 3));
        assert!(!window.contains(12, 1));
        assert!(!window.contains(12, 5));
    }

    #[test]
    fn test_time_window_wraps_midnight() {
        let window = TimeWindow::hours(22, 3);
        assert!(window.contains(23, 1));
        assert!(window.contains(2, 1));
        assert!(!window.contains(12, 1));
    }

    #[test]
    fn test_time_window_float_bounds() {
        let window: TimeWindow = serde_json::from_value(json!({"hourMin": 18.0, "dayMin": 2.0})).unwrap();
        assert!(window.contains(18, 2));
        assert!(!window.contains(17, 2));
        assert!(!window.contains(20, 1));
    }

    #[test]
    fn test_path_stage_gate() {
        let pair = PairState {
            path: "romance".to_string(),
            stage: 4,
        };
        assert!(PathStageGate::default().admits(&pair));

        let gate = PathStageGate {
            path_in: strings(&["romance", "friendship"]),
            stage_min: Some(3.into()),
            stage_max: Some(5.into()),
            ..Default::default()
        };
        assert!(gate.admits(&pair));

        let gate = PathStageGate {
            path_in: strings(&["rivalry"]),
            ..Default::default()
        };
        assert!(!gate.admits(&pair));

        let gate = PathStageGate {
            stage_min: Some(5.into()),
            ..Default::default()
        };
        assert!(!gate.admits(&pair));
    }

    #[test]
    fn test_flag_gate() {
        let set = ["a", "b"];
        let is_set = |f: &str| set.contains(&f);

        assert!(FlagGate::default().admits(is_set));
        assert!(FlagGate {
            require_all: strings(&["a", "b"]),
            ..Default::default()
        }
        .admits(is_set));
        assert!(!FlagGate {
            require_all: strings(&["a", "c"]),
            ..Default::default()
        }
        .admits(is_set));
        assert!(FlagGate {
            require_any: strings(&["c", "b"]),
            ..Default::default()
        }
        .admits(is_set));
        assert!(!FlagGate {
            require_any: strings(&["c", "d"]),
            ..Default::default()
        }
        .admits(is_set));
        assert!(FlagGate {
            require_any: strings(&[]),
            ..Default::default()
        }
        .admits(is_set));
        assert!(!FlagGate {
            forbid: strings(&["b"]),
            ..Default::default()
        }
        .admits(is_set));
    }

    #[test]
    fn test_payload_match() {
        let event = GameEvent::new("interaction.gift")
            .with_location("market")
            .with_item("rose");

        assert!(PayloadMatch::default().admits(&event));
        assert!(PayloadMatch {
            location_in: strings(&["market", "park"]),
            item_in: strings(&["rose"]),
            ..Default::default()
        }
        .admits(&event));
        assert!(!PayloadMatch {
            item_in: strings(&["lily"]),
            ..Default::default()
        }
        .admits(&event));
        assert!(!PayloadMatch {
            witness_in: strings(&["innkeeper"]),
            ..Default::default()
        }
        .admits(&event));
    }

    #[test]
    fn test_gate_blocks_keep_unknown_keys() {
        let raw = json!({
            "time": {"hourMin": 20, "hourMax": 2.0, "season": "winter"},
            "pathStage": {"stageMin": 1, "hint": "after the festival"},
            "weather": "rain"
        });
        let when: RuleWhen = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(when.extra["weather"], "rain");
        assert_eq!(serde_json::to_value(&when).unwrap(), raw);
    }
}
