//! Loads a consistent [`WardrobeState`] from a repository and writes it back.

use std::sync::Arc;

use wardrobe_core::{AdvancedSlot, CatalogSnapshot, CursedKind, Layer, SlotEntry, WardrobeState};

use super::types::ActiveSnapshot;
use super::{
    ActiveStateRepository, CatalogRepository, CursedPoolRepository, EnsembleRepository, Result,
    StateCommitRepository, WardrobeRepository,
};

/// Pairs a repository with the hydration rules applied on load.
#[derive(Clone)]
pub struct WardrobeStore {
    repo: Arc<dyn WardrobeRepository>,
}

impl WardrobeStore {
    pub fn new(repo: Arc<dyn WardrobeRepository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &Arc<dyn WardrobeRepository> {
        &self.repo
    }

    /// Loads every collection and repairs references that no longer resolve.
    ///
    /// Advanced slots pointing at a missing restriction item become empty
    /// entries; restriction layers keep their position but lose their item.
    /// An active ensemble or blindfold whose definition vanished is
    /// cleared.
    pub fn load(&self) -> Result<(WardrobeState, CatalogSnapshot)> {
        let catalog = self.repo.load_catalog()?;
        let mut state = WardrobeState::new();
        state.ensembles = self.repo.load_ensembles()?;
        state.cursed = self.repo.load_cursed()?;

        let ActiveSnapshot {
            active,
            gags,
            blindfold,
        } = self.repo.load_active()?;
        state.active = active;
        state.gags = gags;
        state.blindfold = blindfold;

        repair_references(&mut state, &catalog);

        tracing::info!(
            ensembles = state.ensembles.len(),
            restrictions = catalog.restrictions.len(),
            cursed = state.cursed.len(),
            "wardrobe loaded"
        );
        Ok((state, catalog))
    }

    /// Replaces the ensemble, cursed and active collections with `state`,
    /// all or nothing.
    pub fn save_state(&self, state: &WardrobeState) -> Result<()> {
        self.repo
            .commit_state(&state.ensembles, &state.cursed, &ActiveSnapshot::of(state))
    }

    pub fn save_catalog(&self, catalog: &CatalogSnapshot) -> Result<()> {
        self.repo.save_catalog(catalog)
    }
}

impl std::fmt::Debug for WardrobeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WardrobeStore").finish_non_exhaustive()
    }
}

fn repair_references(state: &mut WardrobeState, catalog: &CatalogSnapshot) {
    for ensemble in &mut state.ensembles {
        for (slot, entry) in &mut ensemble.slots {
            if let SlotEntry::Advanced(advanced) = entry
                && !advanced.is_empty()
                && !catalog.contains_restriction(advanced.restriction)
            {
                tracing::warn!(
                    ensemble = %ensemble.id,
                    ?slot,
                    restriction = %advanced.restriction,
                    "missing restriction item, slot emptied"
                );
                *advanced = AdvancedSlot::empty();
            }
        }
        for layer in &mut ensemble.layers {
            if let Layer::Restriction(layer) = layer
                && !layer.restriction.is_nil()
                && !catalog.contains_restriction(layer.restriction)
            {
                tracing::warn!(
                    ensemble = %ensemble.id,
                    layer = %layer.id,
                    restriction = %layer.restriction,
                    "missing restriction item, layer emptied"
                );
                layer.restriction = uuid::Uuid::nil();
            }
        }
    }

    if let Some(active) = &state.active
        && state.ensemble(active.id).is_none()
    {
        tracing::warn!(ensemble = %active.id, "active ensemble no longer exists, cleared");
        state.active = None;
    }

    if let Some(restriction) = state.blindfold.restriction
        && !catalog.contains_restriction(restriction)
    {
        tracing::warn!(%restriction, "missing blindfold restriction item, reference cleared");
        state.blindfold.restriction = None;
    }

    for item in &state.cursed {
        if let CursedKind::Restriction(restriction) = item.kind
            && !catalog.contains_restriction(restriction)
        {
            tracing::warn!(
                cursed = %item.id,
                %restriction,
                "cursed item targets a missing restriction"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{FileWardrobeRepository, InMemoryWardrobeRepo};
    use uuid::Uuid;
    use chrono::{TimeDelta, Utc};
    use wardrobe_core::{
        ActiveEnsemble, CursedItem, EquipSlot, GagType, GlamourItem, ItemId, RestraintEnsemble,
        RestrictionItem, UserUid,
    };

    #[test]
    fn dangling_references_degrade_to_empty() {
        let cuffs = RestrictionItem::new("cuffs", GlamourItem::new(EquipSlot::Hands, ItemId(7)));
        let ghost = Uuid::new_v4();
        let ensemble = RestraintEnsemble::new("jail")
            .with_slot(EquipSlot::Hands, SlotEntry::advanced(cuffs.id))
            .with_slot(EquipSlot::Feet, SlotEntry::advanced(ghost))
            .with_layer(Layer::restriction(ghost));
        let catalog = CatalogSnapshot::new().with_restriction(cuffs.clone());

        let repo =
            InMemoryWardrobeRepo::with_definitions(vec![ensemble.clone()], catalog, Vec::new());
        let (state, _) = WardrobeStore::new(Arc::new(repo)).load().unwrap();

        let loaded = state.ensemble(ensemble.id).unwrap();
        assert_eq!(loaded.slots[&EquipSlot::Hands], SlotEntry::advanced(cuffs.id));
        assert_eq!(
            loaded.slots[&EquipSlot::Feet],
            SlotEntry::Advanced(AdvancedSlot::empty())
        );
        let Layer::Restriction(layer) = &loaded.layers[0] else {
            panic!("layer kind changed");
        };
        assert!(layer.restriction.is_nil());
    }

    #[test]
    fn vanished_active_ensemble_is_cleared() {
        let repo = Arc::new(InMemoryWardrobeRepo::new());
        let mut snapshot = ActiveSnapshot::default();
        snapshot.active = Some(ActiveEnsemble::new(Uuid::new_v4(), UserUid::new("alice")));
        repo.save_active(&snapshot).unwrap();

        let (state, _) = WardrobeStore::new(repo).load().unwrap();
        assert!(state.active.is_none());
    }

    #[test]
    fn save_state_marks_the_enabled_ensemble() {
        let repo = Arc::new(InMemoryWardrobeRepo::new());
        let store = WardrobeStore::new(repo.clone());

        let ensemble = RestraintEnsemble::new("worn");
        let mut state = WardrobeState::new();
        state.ensembles.push(ensemble.clone());
        state.active = Some(ActiveEnsemble::new(ensemble.id, UserUid::new("alice")));
        state.cursed.push(CursedItem::new(
            "mimic",
            CursedKind::Restriction(Uuid::new_v4()),
        ));
        store.save_state(&state).unwrap();

        assert_eq!(repo.enabled_ensemble().unwrap(), Some(ensemble.id));
        let (loaded, _) = store.load().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn failed_save_keeps_the_previous_state_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(FileWardrobeRepository::new(dir.path()).unwrap());
        let store = WardrobeStore::new(repo);

        let mut state = WardrobeState::new();
        state
            .cursed
            .push(CursedItem::new("tape", CursedKind::Gag(GagType::DuctTape)));
        store.save_state(&state).unwrap();

        let blocker = dir.path().join("active.json.tmp");
        std::fs::create_dir(&blocker).unwrap();
        let mut next = state.clone();
        let now = Utc::now();
        assert!(next.cursed[0].activate(now, now + TimeDelta::minutes(30)));
        assert!(store.save_state(&next).is_err());
        std::fs::remove_dir(&blocker).unwrap();

        let (reloaded, _) = store.load().unwrap();
        assert_eq!(reloaded, state);
        assert_eq!(reloaded.active_cursed().count(), 0);
    }
}
