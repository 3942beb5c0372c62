//! The diary collaborator: narrative log plus per-pair path/stage state.
//!
//! The engine only consumes the [`Diary`] trait. [`MemoryDiary`] is a
//! complete in-process implementation for tests and embedding.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Narrative progression between two characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairState {
    pub path: String,
    pub stage: i32,
}

impl Default for PairState {
    fn default() -> Self {
        Self {
            path: "neutral".to_string(),
            stage: 0,
        }
    }
}

/// Partial update to a [`PairState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairStatePatch {
    pub path: Option<String>,
    pub stage: Option<i32>,
}

/// One diary line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub text: String,
    pub path: String,
    pub stage: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl DiaryEntry {
    pub fn new(text: impl Into<String>, path: impl Into<String>, stage: i32) -> Self {
        Self {
            text: text.into(),
            path: path.into(),
            stage,
            mood: None,
            tags: Vec::new(),
        }
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Diary write failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiaryError {
    #[error("Diary rejected entry: {0}")]
    Rejected(String),

    #[error("Diary is busy")]
    Busy,
}

/// Interface the trigger engine needs from the diary.
pub trait Diary {
    fn append_entry(&mut self, entry: DiaryEntry) -> Result<(), DiaryError>;

    fn pair_state(&self, character_id: &str, target_id: &str) -> PairState;

    fn set_pair_state(&mut self, character_id: &str, target_id: &str, patch: PairStatePatch);

    /// Entries on `path` tagged as desires.
    fn desire_entries(&self, path: &str) -> Vec<DiaryEntry>;

    /// Authored line for an event key at the given progression.
    fn event_line(&self, event_key: &str, path: &str, stage: i32) -> Option<String>;

    /// Record that `who` saw the pair at this progression.
    fn log_witnessed(&mut self, who: &str, pair: &PairState) -> Result<(), DiaryError>;
}

/// Tag marking desire entries.
pub const DESIRE_TAG: &str = "desire";

/// Authored line for [`Diary::event_line`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLine {
    /// Restrict to one path; any path when absent.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub min_stage: i32,
    pub text: String,
}

/// In-memory diary.
#[derive(Debug, Clone, Default)]
pub struct MemoryDiary {
    entries: Vec<DiaryEntry>,
    pairs: HashMap<(String, String), PairState>,
    event_lines: HashMap<String, Vec<EventLine>>,
    witnessed: Vec<(String, PairState)>,
}

impl MemoryDiary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an authored line under `event_key`.
    pub fn add_event_line(&mut self, event_key: impl Into<String>, line: EventLine) {
        self.event_lines.entry(event_key.into()).or_default().push(line);
    }

    pub fn entries(&self) -> &[DiaryEntry] {
        &self.entries
    }

    pub fn witnessed(&self) -> &[(String, PairState)] {
        &self.witnessed
    }
}

impl Diary for MemoryDiary {
    fn append_entry(&mut self, entry: DiaryEntry) -> Result<(), DiaryError> {
        if entry.text.trim().is_empty() {
            return Err(DiaryError::Rejected("empty text".to_string()));
        }
        self.entries.push(entry);
        Ok(())
    }

    fn pair_state(&self, character_id: &str, target_id: &str) -> PairState {
        self.pairs
            .get(&(character_id.to_string(), target_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn set_pair_state(&mut self, character_id: &str, target_id: &str, patch: PairStatePatch) {
        let pair = self
            .pairs
            .entry((character_id.to_string(), target_id.to_string()))
            .or_default();
        if let Some(path) = patch.path {
            pair.path = path;
        }
        if let Some(stage) = patch.stage {
            pair.stage = stage;
        }
    }

    fn desire_entries(&self, path: &str) -> Vec<DiaryEntry> {
        self.entries
            .iter()
            .filter(|e| e.path == path && e.has_tag(DESIRE_TAG))
            .cloned()
            .collect()
    }

    fn event_line(&self, event_key: &str, path: &str, stage: i32) -> Option<String> {
        self.event_lines
            .get(event_key)?
            .iter()
            .filter(|line| line.path.as_deref().map_or(true, |p| p == path))
            .filter(|line| line.min_stage <= stage)
            .max_by_key(|line| (line.path.is_some(), line.min_stage))
            .map(|line| line.text.clone())
    }

    fn log_witnessed(&mut self, who: &str, pair: &PairState) -> Result<(), DiaryError> {
        self.witnessed.push((who.to_string(), pair.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_state_defaults_and_patch() {
        let mut diary = MemoryDiary::new();
        assert_eq!(diary.pair_state("ava", "ben"), PairState::default());

        diary.set_pair_state(
            "ava",
            "ben",
            PairStatePatch {
                stage: Some(3),
                ..Default::default()
            },
        );
        diary.set_pair_state(
            "ava",
            "ben",
            PairStatePatch {
                path: Some("romance".to_string()),
                ..Default::default()
            },
        );

        let pair = diary.pair_state("ava", "ben");
        assert_eq!(pair.path, "romance");
        assert_eq!(pair.stage, 3);
        assert_eq!(diary.pair_state("ben", "ava"), PairState::default());
    }

    #[test]
    fn test_append_rejects_blank() {
        let mut diary = MemoryDiary::new();
        assert!(diary.append_entry(DiaryEntry::new("  ", "neutral", 0)).is_err());
        assert!(diary.append_entry(DiaryEntry::new("We talked.", "neutral", 0)).is_ok());
        assert_eq!(diary.entries().len(), 1);
    }

    #[test]
    fn test_desire_entries() {
        let mut diary = MemoryDiary::new();
        diary
            .append_entry(DiaryEntry::new("I want to see the sea.", "romance", 2).with_tags([DESIRE_TAG]))
            .unwrap();
        diary
            .append_entry(DiaryEntry::new("Rain again.", "romance", 2))
            .unwrap();
        diary
            .append_entry(DiaryEntry::new("Beat them at cards.", "rivalry", 1).with_tags([DESIRE_TAG]))
            .unwrap();

        let desires = diary.desire_entries("romance");
        assert_eq!(desires.len(), 1);
        assert_eq!(desires[0].text, "I want to see the sea.");
    }

    #[test]
    fn test_event_line_prefers_specific_path_and_stage() {
        let mut diary = MemoryDiary::new();
        diary.add_event_line(
            "kiss",
            EventLine {
                path: None,
                min_stage: 0,
                text: "A quick kiss.".to_string(),
            },
        );
        diary.add_event_line(
            "kiss",
            EventLine {
                path: Some("romance".to_string()),
                min_stage: 4,
                text: "A long kiss.".to_string(),
            },
        );

        assert_eq!(diary.event_line("kiss", "romance", 5).as_deref(), Some("A long kiss."));
        assert_eq!(diary.event_line("kiss", "romance", 1).as_deref(), Some("A quick kiss."));
        assert_eq!(diary.event_line("kiss", "rivalry", 9).as_deref(), Some("A quick kiss."));
        assert!(diary.event_line("hug", "romance", 9).is_none());
    }

    #[test]
    fn test_log_witnessed() {
        let mut diary = MemoryDiary::new();
        let pair = PairState {
            path: "romance".to_string(),
            stage: 2,
        };
        diary.log_witnessed("innkeeper", &pair).unwrap();
        assert_eq!(diary.witnessed(), &[("innkeeper".to_string(), pair)]);
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = DiaryEntry::new("Hello", "neutral", 0);
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("mood").is_none());
        assert!(json.get("tags").is_none());
    }
}
