//! Persisted shape of the active/applied/locked sub-state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wardrobe_core::{
    ActiveEnsemble, ActiveLock, BlindfoldState, GagSlot, GagType, LayerSelection, Padlock,
    PadlockState, Timestamp, UserUid, WardrobeConfig, WardrobeState,
};

/// The sub-state of [`WardrobeState`] that is not a definition collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActiveSnapshot {
    pub active: Option<ActiveEnsemble>,
    pub gags: [GagSlot; WardrobeConfig::GAG_SLOTS],
    pub blindfold: BlindfoldState,
}

impl ActiveSnapshot {
    pub fn of(state: &WardrobeState) -> Self {
        Self {
            active: state.active.clone(),
            gags: state.gags.clone(),
            blindfold: state.blindfold.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LockDocument {
    pub padlock: Padlock,
    pub password: Option<String>,
    pub release: Option<Timestamp>,
    pub assigner: Option<UserUid>,
}

impl From<&PadlockState> for LockDocument {
    fn from(state: &PadlockState) -> Self {
        match state.active() {
            None => Self::default(),
            Some(lock) => Self {
                padlock: lock.padlock,
                password: lock.password.clone(),
                release: lock.release,
                assigner: Some(lock.assigner.clone()),
            },
        }
    }
}

impl From<LockDocument> for PadlockState {
    fn from(doc: LockDocument) -> Self {
        if doc.padlock == Padlock::None {
            return PadlockState::Unlocked;
        }
        PadlockState::Locked(ActiveLock {
            padlock: doc.padlock,
            password: doc.password,
            release: doc.release,
            assigner: doc.assigner.unwrap_or_else(UserUid::system),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveEnsembleDocument {
    pub id: Uuid,
    pub enabler: UserUid,
    pub lock: LockDocument,
    pub layers: LayerSelection,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GagSlotDocument {
    pub gag: Option<GagType>,
    pub enabler: Option<UserUid>,
    pub lock: LockDocument,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlindfoldDocument {
    pub active: bool,
    pub restriction: Option<Uuid>,
    pub enabler: Option<UserUid>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveDocument {
    pub version: u32,
    pub ensemble: Option<ActiveEnsembleDocument>,
    pub gags: Vec<GagSlotDocument>,
    pub blindfold: BlindfoldDocument,
}

impl From<&ActiveSnapshot> for ActiveDocument {
    fn from(snapshot: &ActiveSnapshot) -> Self {
        Self {
            version: super::SCHEMA_VERSION,
            ensemble: snapshot.active.as_ref().map(|active| ActiveEnsembleDocument {
                id: active.id,
                enabler: active.enabler.clone(),
                lock: LockDocument::from(&active.padlock),
                layers: active.layers,
            }),
            gags: snapshot
                .gags
                .iter()
                .map(|slot| GagSlotDocument {
                    gag: slot.gag,
                    enabler: slot.enabler.clone(),
                    lock: LockDocument::from(&slot.padlock),
                })
                .collect(),
            blindfold: BlindfoldDocument {
                active: snapshot.blindfold.active,
                restriction: snapshot.blindfold.restriction,
                enabler: snapshot.blindfold.enabler.clone(),
            },
        }
    }
}

impl ActiveDocument {
    /// Extra gag entries are ignored; missing ones are empty. A lock on an
    /// empty gag slot is dropped.
    pub fn into_snapshot(self) -> ActiveSnapshot {
        let mut snapshot = ActiveSnapshot::default();

        snapshot.active = self
            .ensemble
            .filter(|doc| !doc.id.is_nil())
            .map(|doc| ActiveEnsemble {
                id: doc.id,
                enabler: doc.enabler,
                padlock: doc.lock.into(),
                layers: doc.layers,
            });

        for (slot, doc) in snapshot.gags.iter_mut().zip(self.gags) {
            if doc.gag.is_none() {
                continue;
            }
            *slot = GagSlot {
                gag: doc.gag,
                enabler: doc.enabler,
                padlock: doc.lock.into(),
            };
        }

        snapshot.blindfold = BlindfoldState {
            active: self.blindfold.active,
            restriction: self.blindfold.restriction,
            enabler: self.blindfold.enabler,
        };
        snapshot
    }
}
