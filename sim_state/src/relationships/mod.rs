//! Relationship ladder and progression mechanics.

mod progression;
mod tiers;

pub use progression::*;
pub use tiers::*;
