//! Error types for simulation state.

use thiserror::Error;

/// Rejected mutation of persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
}

/// Failure to load simulation configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Tier ladder is empty")]
    EmptyLadder,

    #[error("Neutral tier index {neutral} outside ladder of {len} tiers")]
    NeutralOutOfRange { neutral: usize, len: usize },
}
