//! Authoritative wardrobe state.
//!
//! [`WardrobeState`] is the input of the recalculation aggregator and the
//! value the runtime persists. Its active/applied/locked sub-state is only
//! mutated through the padlock state machine and the runtime's apply
//! pipeline.
pub mod types;

pub use types::*;

use uuid::Uuid;

use crate::config::WardrobeConfig;
use crate::lock::Lockable;

/// Global blindfold state, independent of any ensemble.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlindfoldState {
    pub active: bool,
    /// Blindfold restriction item worn while active.
    pub restriction: Option<Uuid>,
    pub enabler: Option<UserUid>,
}

/// Everything the aggregator needs besides the item catalog.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WardrobeState {
    pub ensembles: Vec<RestraintEnsemble>,
    /// At most one ensemble is active at a time.
    pub active: Option<ActiveEnsemble>,
    pub gags: [GagSlot; WardrobeConfig::GAG_SLOTS],
    pub blindfold: BlindfoldState,
    pub cursed: Vec<CursedItem>,
}

impl WardrobeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensemble(&self, id: Uuid) -> Option<&RestraintEnsemble> {
        self.ensembles.iter().find(|e| e.id == id)
    }

    pub fn ensemble_mut(&mut self, id: Uuid) -> Option<&mut RestraintEnsemble> {
        self.ensembles.iter_mut().find(|e| e.id == id)
    }

    /// The active ensemble's definition, if one is active and still exists.
    pub fn active_ensemble(&self) -> Option<&RestraintEnsemble> {
        self.active.as_ref().and_then(|active| self.ensemble(active.id))
    }

    pub fn is_enabled(&self, id: Uuid) -> bool {
        self.active.as_ref().is_some_and(|active| active.id == id)
    }

    pub fn gag_slot(&self, layer: usize) -> Option<&GagSlot> {
        self.gags.get(layer)
    }

    pub fn gag_slot_mut(&mut self, layer: usize) -> Option<&mut GagSlot> {
        self.gags.get_mut(layer)
    }

    /// Lowest-index slot that holds no gag.
    pub fn first_free_gag_slot(&self) -> Option<usize> {
        self.gags.iter().position(GagSlot::is_empty)
    }

    pub fn cursed_item(&self, id: Uuid) -> Option<&CursedItem> {
        self.cursed.iter().find(|item| item.id == id)
    }

    pub fn cursed_item_mut(&mut self, id: Uuid) -> Option<&mut CursedItem> {
        self.cursed.iter_mut().find(|item| item.id == id)
    }

    pub fn active_cursed(&self) -> impl Iterator<Item = &CursedItem> {
        self.cursed.iter().filter(|item| item.is_active())
    }

    /// Whether an applied cursed item holds `gag`.
    pub fn is_cursed_gag(&self, gag: GagType) -> bool {
        self.active_cursed()
            .any(|item| item.kind == CursedKind::Gag(gag))
    }

    /// Every lockable entity currently holding a padlock.
    pub fn locked_count(&self) -> usize {
        let ensemble = self
            .active
            .as_ref()
            .is_some_and(|active| active.lock_state().is_locked());
        usize::from(ensemble) + self.gags.iter().filter(|slot| slot.is_locked()).count()
    }
}
