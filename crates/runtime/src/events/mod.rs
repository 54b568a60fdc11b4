//! Topic-based event bus for wardrobe events.
//!
//! Events are published after the state change they describe has been
//! persisted. Consumers subscribe only to the topics they need.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{CursedEvent, EnsembleEvent, GagEvent, LockEvent, LockTarget, PlanEvent};
