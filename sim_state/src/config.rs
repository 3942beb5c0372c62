//! Simulation configuration loaded from TOML.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::{default_base_date, GameClock, DEFAULT_START_HOUR};
use crate::error::ConfigError;
use crate::relationships::TierLadder;

/// Tuning for relationship gains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Exponent applied to the gain percentage. 1.0 is linear.
    pub stiffness: f64,
    /// Score points a relationship may move per game day.
    pub daily_cap: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            stiffness: 1.5,
            daily_cap: 30,
        }
    }
}

/// Top-level configuration for a simulation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub base_date: NaiveDate,
    pub start_hour: u8,
    pub start_minute: u8,
    pub progression: ProgressionConfig,
    pub ladder: TierLadder,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            base_date: default_base_date(),
            start_hour: DEFAULT_START_HOUR,
            start_minute: 0,
            progression: ProgressionConfig::default(),
            ladder: TierLadder::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a TOML document. Missing sections use defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(source)?;
        config.ladder.validate()?;
        Ok(config)
    }

    /// Clock value a fresh session starts from.
    pub fn start_clock(&self) -> GameClock {
        GameClock::normalized(
            self.base_date,
            1,
            i64::from(self.start_hour),
            i64::from(self.start_minute),
        )
    }
}
