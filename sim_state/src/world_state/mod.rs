//! Global narrative switches: boolean flags and timed cooldowns.

mod cooldowns;
mod flags;

pub use cooldowns::*;
pub use flags::*;
