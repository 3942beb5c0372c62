//! # Sim State
//!
//! The simulation's state layer: the in-game clock, the relationship tier
//! ladder with its progression mechanics, per-character mind overrides, and
//! global flags and cooldowns. This crate holds no event or rule logic.
//!
//! Persisted stores take an injected [`KeyValueStore`] so sessions can run
//! against [`MemoryStore`] in tests and a durable backend in production.

pub mod clock;
pub mod config;
pub mod error;
pub mod mind;
pub mod relationships;
pub mod storage;
pub mod world_state;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use mind::*;
pub use relationships::*;
pub use storage::{KeyValueStore, MemoryStore};
pub use world_state::*;
