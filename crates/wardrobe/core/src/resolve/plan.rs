//! Recalculation aggregator: merges every source into one application plan.
//!
//! Merge order, later steps overwriting earlier ones per equip slot:
//!
//! 1. the active ensemble, resolved through [`LayerResolver`]
//! 2. occupied gag slots, from the outermost slot in to slot 0
//! 3. the blindfold, when the global blindfold state is set
//! 4. the cursed pool, gag-kind items first, then the per-slot winners
//!
//! Traits, arousal and statuses accumulate across all steps. Mods are keyed
//! by container; a later source replaces an earlier preset for the same
//! container.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;
use uuid::Uuid;

use super::contribution::Contributions;
use super::cursed::resolve_pool;
use super::layers::LayerResolver;
use crate::env::WardrobeEnv;
use crate::state::{
    Arousal, BlindfoldOverlay, CursedKind, CustomizeProfile, EquipSlot, GagItem, GlamourItem,
    HypnoticOverlay, MetaFlags, ModAssociation, Moodle, RestrictionItem, Traits, WardrobeState,
};

/// Which source put an item into an equip slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlanSource {
    Ensemble(Uuid),
    Gag(usize),
    Blindfold(Uuid),
    Cursed(Uuid),
}

/// Conflict-free target state handed to the external applicators.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApplicationPlan {
    pub glamour: BTreeMap<EquipSlot, GlamourItem>,
    pub sources: BTreeMap<EquipSlot, PlanSource>,
    pub meta: MetaFlags,
    pub mods: Vec<ModAssociation>,
    pub moodles: Vec<Moodle>,
    /// Status ids expected to be present once the plan is applied.
    pub statuses: BTreeSet<Uuid>,
    pub traits: Traits,
    pub arousal: Arousal,
    pub blindfold: Option<BlindfoldOverlay>,
    pub hypnotic: Option<HypnoticOverlay>,
    pub customize: Option<CustomizeProfile>,
}

impl ApplicationPlan {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn glamour_at(&self, slot: EquipSlot) -> Option<&GlamourItem> {
        self.glamour.get(&slot)
    }

    pub fn source_of(&self, slot: EquipSlot) -> Option<PlanSource> {
        self.sources.get(&slot).copied()
    }

    /// Mods present in `previous` whose container no longer appears here.
    pub fn removed_mods<'p>(&self, previous: &'p ApplicationPlan) -> Vec<&'p ModAssociation> {
        previous
            .mods
            .iter()
            .filter(|old| !self.mods.iter().any(|new| new.key() == old.key()))
            .collect()
    }

    /// Mods here that were absent from `previous` or changed preset.
    pub fn added_mods<'s>(&'s self, previous: &ApplicationPlan) -> Vec<&'s ModAssociation> {
        self.mods
            .iter()
            .filter(|new| !previous.mods.contains(new))
            .collect()
    }
}

/// Builds [`ApplicationPlan`]s from wardrobe state and the item catalog.
#[derive(Clone, Copy, Debug)]
pub struct Recalculator<'a> {
    env: WardrobeEnv<'a>,
}

impl<'a> Recalculator<'a> {
    pub fn new(env: WardrobeEnv<'a>) -> Self {
        Self { env }
    }

    /// Produces the plan for `state`. Pure and idempotent.
    pub fn recalculate(&self, state: &WardrobeState) -> ApplicationPlan {
        let mut builder = PlanBuilder::default();

        // 1. Active ensemble.
        if let Some(active) = &state.active {
            match state.ensemble(active.id) {
                Some(ensemble) => {
                    let resolved = LayerResolver::new(self.env).resolve(ensemble, active.layers);
                    builder.ensemble(ensemble.id, resolved);
                    builder.meta.merge(&ensemble.meta);
                    builder.customize(ensemble.customize);
                }
                None => warn!(ensemble = %active.id, "active ensemble no longer exists"),
            }
        }

        // 2. Gag slots, outermost first so slot 0 has the final say. Slots
        //    held by cursed gags contribute in step 4.
        for (index, slot) in state.gags.iter().enumerate().rev() {
            let Some(gag) = slot.gag else { continue };
            if state.is_cursed_gag(gag) {
                continue;
            }
            match self.env.gag_item(gag) {
                Some(item) => builder.gag(PlanSource::Gag(index), item),
                None => {
                    warn!(%gag, slot = index, "no definition for worn gag");
                    builder.traits |= Traits::GAGGED;
                }
            }
        }

        // 3. Blindfold.
        if state.blindfold.active {
            builder.traits |= Traits::BLINDFOLDED;
            if let Some(id) = state.blindfold.restriction {
                match self.env.restriction(id) {
                    Some(item) => {
                        builder.restriction(PlanSource::Blindfold(id), item);
                        if let Some(overlay) = item.blindfold() {
                            builder.blindfold = Some(overlay.clone());
                        }
                    }
                    None => {
                        warn!(restriction = %id, "blindfold references a missing restriction item")
                    }
                }
            }
        }

        // 4. Cursed pool.
        let pool = resolve_pool(&state.cursed, &self.env);
        for (item, gag) in &pool.gags {
            match self.env.gag_item(*gag) {
                Some(definition) => builder.gag(PlanSource::Cursed(item.id), definition),
                None => builder.traits |= Traits::GAGGED,
            }
        }
        for winner in pool.slots.values() {
            if let CursedKind::Restriction(id) = winner.kind {
                if let Some(item) = self.env.restriction(id) {
                    builder.restriction(PlanSource::Cursed(winner.id), item);
                    if let Some(overlay) = item.blindfold() {
                        builder.blindfold = Some(overlay.clone());
                    }
                    if let Some(overlay) = item.hypnotic() {
                        builder.hypnotic = Some(overlay.clone());
                    }
                }
            }
        }

        builder.finish()
    }
}

/// Convenience for a one-off recalculation.
pub fn recalculate(state: &WardrobeState, env: WardrobeEnv<'_>) -> ApplicationPlan {
    Recalculator::new(env).recalculate(state)
}

#[derive(Default)]
struct PlanBuilder {
    glamour: BTreeMap<EquipSlot, GlamourItem>,
    sources: BTreeMap<EquipSlot, PlanSource>,
    meta: MetaFlags,
    mods: Vec<ModAssociation>,
    moodles: Vec<Moodle>,
    traits: Traits,
    arousal: Arousal,
    blindfold: Option<BlindfoldOverlay>,
    hypnotic: Option<HypnoticOverlay>,
    customize: Option<CustomizeProfile>,
}

impl PlanBuilder {
    fn put(&mut self, source: PlanSource, glamour: GlamourItem) {
        self.sources.insert(glamour.slot, source);
        self.glamour.insert(glamour.slot, glamour);
    }

    fn mod_association(&mut self, association: &ModAssociation) {
        if !association.preset.is_valid() {
            return;
        }
        match self.mods.iter_mut().find(|m| m.key() == association.key()) {
            Some(existing) => *existing = association.clone(),
            None => self.mods.push(association.clone()),
        }
    }

    fn moodle(&mut self, moodle: &Moodle) {
        if moodle.is_valid() && !self.moodles.iter().any(|m| m.id() == moodle.id()) {
            self.moodles.push(moodle.clone());
        }
    }

    fn customize(&mut self, profile: Option<CustomizeProfile>) {
        let Some(profile) = profile else { return };
        match self.customize {
            Some(current) if current.priority > profile.priority => {}
            _ => self.customize = Some(profile),
        }
    }

    fn ensemble(&mut self, id: Uuid, resolved: Contributions) {
        self.arousal = self.arousal.max(resolved.peak_arousal());
        for glamour in resolved.glamour.into_values() {
            self.put(PlanSource::Ensemble(id), glamour);
        }
        for association in &resolved.mods {
            self.mod_association(association);
        }
        for moodle in &resolved.moodles {
            self.moodle(moodle);
        }
        self.traits |= resolved.traits;
        self.blindfold = resolved.blindfold;
        self.hypnotic = resolved.hypnotic;
    }

    /// Behavioral facets apply while worn; visuals only while the gag's
    /// definition is enabled.
    fn gag(&mut self, source: PlanSource, item: &GagItem) {
        self.traits |= item.traits;
        self.arousal = self.arousal.max(item.arousal);
        if !item.enabled {
            return;
        }
        if let Some(glamour) = &item.glamour {
            self.put(source, glamour.clone());
        }
        if let Some(association) = &item.mods {
            self.mod_association(association);
        }
        if let Some(moodle) = &item.moodle {
            self.moodle(moodle);
        }
        self.meta.merge(&item.meta);
        self.customize(item.customize);
    }

    fn restriction(&mut self, source: PlanSource, item: &RestrictionItem) {
        if !(item.overlay && item.glamour.is_nothing()) {
            self.put(source, item.glamour.clone());
        }
        if let Some(association) = &item.mods {
            self.mod_association(association);
        }
        if let Some(moodle) = &item.moodle {
            self.moodle(moodle);
        }
        self.traits |= item.traits;
        self.arousal = self.arousal.max(item.arousal);
    }

    fn finish(self) -> ApplicationPlan {
        let statuses = self.moodles.iter().flat_map(Moodle::status_ids).collect();
        ApplicationPlan {
            glamour: self.glamour,
            sources: self.sources,
            meta: self.meta,
            mods: self.mods,
            moodles: self.moodles,
            statuses,
            traits: self.traits,
            arousal: self.arousal,
            blindfold: self.blindfold,
            hypnotic: self.hypnotic,
            customize: self.customize,
        }
    }
}
