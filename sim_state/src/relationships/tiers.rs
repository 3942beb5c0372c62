//! Tier ladder definitions.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Flag requirement for promotion into a tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierGate {
    pub flag: String,
}

/// One rung of the relationship ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierDefinition {
    pub id: String,
    pub name: String,
    /// Score points moved toward neutral per idle day.
    pub decay_per_day: u32,
    /// Decay below this score drops the relationship a tier instead of
    /// pinning it at the boundary.
    pub drop_floor: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<TierGate>,
}

impl TierDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            decay_per_day: 0,
            drop_floor: 0,
            gate: None,
        }
    }

    pub fn with_decay(mut self, decay_per_day: u32, drop_floor: u32) -> Self {
        self.decay_per_day = decay_per_day;
        self.drop_floor = drop_floor.min(100);
        self
    }

    pub fn with_gate(mut self, flag: impl Into<String>) -> Self {
        self.gate = Some(TierGate { flag: flag.into() });
        self
    }
}

/// Ordered tiers, index 0 being the most negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLadder {
    tiers: Vec<TierDefinition>,
    neutral: usize,
}

impl TierLadder {
    pub fn new(tiers: Vec<TierDefinition>, neutral: usize) -> Result<Self, ConfigError> {
        let ladder = Self { tiers, neutral };
        ladder.validate()?;
        Ok(ladder)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tiers.is_empty() {
            return Err(ConfigError::EmptyLadder);
        }
        if self.neutral >= self.tiers.len() {
            return Err(ConfigError::NeutralOutOfRange {
                neutral: self.neutral,
                len: self.tiers.len(),
            });
        }
        Ok(())
    }

    pub fn neutral(&self) -> usize {
        self.neutral
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Highest valid tier index.
    pub fn top(&self) -> usize {
        self.tiers.len().saturating_sub(1)
    }

    pub fn get(&self, index: usize) -> Option<&TierDefinition> {
        self.tiers.get(index)
    }

    pub fn tiers(&self) -> &[TierDefinition] {
        &self.tiers
    }

    /// Index of the tier with the given id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.tiers.iter().position(|t| t.id == id)
    }
}

impl Default for TierLadder {
    fn default() -> Self {
        Self {
            tiers: vec![
                TierDefinition::new("enemy", "Enemy").with_decay(1, 0),
                TierDefinition::new("rival", "Rival").with_decay(2, 10),
                TierDefinition::new("wary", "Wary").with_decay(3, 20),
                TierDefinition::new("stranger", "Stranger").with_decay(1, 0),
                TierDefinition::new("acquaintance", "Acquaintance").with_decay(3, 20),
                TierDefinition::new("friend", "Friend").with_decay(2, 10),
                TierDefinition::new("close_friend", "Close Friend").with_decay(1, 5),
                TierDefinition::new("partner", "Partner")
                    .with_decay(1, 0)
                    .with_gate("confessed"),
            ],
            neutral: 3,
        }
    }
}
