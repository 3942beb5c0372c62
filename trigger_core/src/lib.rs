//! # Trigger Core
//!
//! The reactive half of the simulation. Gameplay emits events on a [`Bus`];
//! the [`TriggerEngine`] checks each installed rule against the event and the
//! current state from `sim_state`, then runs the rule's actions.
//!
//! ## Core Components
//!
//! - **events**: Game events, event patterns, and the synchronous bus
//! - **rules**: Declarative JSON rule documents, their gates and actions
//! - **engine**: Gate evaluation and action execution
//! - **diary**: The narrative log and pair state the actions write to
//!
//! ## Design Philosophy
//!
//! - **Data-Driven**: Designers author behavior as rule documents, not code
//! - **Event-Driven**: The engine reacts to events and never owns the game loop
//! - **Isolated**: A failing rule never prevents its siblings from running

pub mod diary;
pub mod engine;
pub mod events;
pub mod rules;

pub use diary::*;
pub use engine::*;
pub use events::*;
pub use rules::*;
