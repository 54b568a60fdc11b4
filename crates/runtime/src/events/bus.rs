//! Topic-based event bus implementation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::EnumCount;
use tokio::sync::broadcast;

use super::types::{CursedEvent, EnsembleEvent, GagEvent, LockEvent, PlanEvent};

/// Topics for event routing
#[derive(
    Debug,
    Clone,
    Copy,
    Hash,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum::EnumCount,
    strum::EnumIter,
)]
pub enum Topic {
    /// Ensemble enable/disable and layer changes
    Ensemble,
    /// Gag slot changes
    Gag,
    /// Padlock transitions on any lockable entity
    Lock,
    /// Cursed loot application and removal
    Cursed,
    /// Newly published application plans
    Plan,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Ensemble(EnsembleEvent),
    Gag(GagEvent),
    Lock(LockEvent),
    Cursed(CursedEvent),
    Plan(PlanEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Ensemble(_) => Topic::Ensemble,
            Event::Gag(_) => Topic::Gag,
            Event::Lock(_) => Topic::Lock,
            Event::Cursed(_) => Topic::Cursed,
            Event::Plan(_) => Topic::Plan,
        }
    }
}

macro_rules! impl_from_event {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Event {
                fn from(event: $ty) -> Self {
                    Event::$variant(event)
                }
            }
        )*
    };
}

impl_from_event! {
    Ensemble => EnsembleEvent,
    Gag => GagEvent,
    Lock => LockEvent,
    Cursed => CursedEvent,
    Plan => PlanEvent,
}

/// Topic-based event bus
///
/// Publishing never blocks; events without subscribers are dropped.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<[broadcast::Sender<Event>; Topic::COUNT]>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(std::array::from_fn(|_| broadcast::channel(capacity).0)),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.channels[topic as usize].send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels[topic as usize].subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> Vec<(Topic, broadcast::Receiver<Event>)> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}
