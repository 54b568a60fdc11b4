//! Event types for different topics.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wardrobe_core::{GagType, Padlock, Timestamp, UserUid};

/// Ensemble activation changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnsembleEvent {
    Enabled { id: Uuid, enactor: UserUid },
    Disabled { id: Uuid, enactor: UserUid },
    LayersChanged { id: Uuid, layers: u32 },
}

/// Gag slot changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GagEvent {
    Applied {
        slot: usize,
        gag: GagType,
        enactor: UserUid,
    },
    Removed {
        slot: usize,
        gag: GagType,
        enactor: UserUid,
    },
}

/// Which lockable entity a lock event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockTarget {
    Ensemble(Uuid),
    Gag(usize),
}

/// Padlock transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockEvent {
    Locked {
        target: LockTarget,
        padlock: Padlock,
        enactor: UserUid,
    },
    Unlocked {
        target: LockTarget,
        padlock: Padlock,
        enactor: UserUid,
    },
    /// Timer ran out and the system removed the padlock.
    Expired { target: LockTarget, padlock: Padlock },
}

/// Cursed loot changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursedEvent {
    Applied {
        id: Uuid,
        applied: Timestamp,
        release: Timestamp,
    },
    Removed { id: Uuid },
}

/// A new application plan was published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEvent {
    /// Monotonic revision of the published plan.
    pub revision: u64,
}
