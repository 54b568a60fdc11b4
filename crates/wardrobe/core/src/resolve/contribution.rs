//! Accumulators shared by the resolvers and the aggregator.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::state::{
    Arousal, BlindfoldOverlay, EquipSlot, GlamourItem, HypnoticOverlay, ModAssociation, Moodle,
    RestrictionFlags, RestrictionItem, StainIds, Traits,
};

/// Everything an ensemble contributes once its layers and base slots are
/// resolved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contributions {
    pub glamour: BTreeMap<EquipSlot, GlamourItem>,
    pub mods: Vec<ModAssociation>,
    pub moodles: Vec<Moodle>,
    pub traits: Traits,
    /// Every non-zero arousal contributed, in resolution order.
    pub arousal: Vec<Arousal>,
    pub blindfold: Option<BlindfoldOverlay>,
    pub hypnotic: Option<HypnoticOverlay>,
}

impl Contributions {
    /// Strongest accumulated arousal.
    pub fn peak_arousal(&self) -> Arousal {
        self.arousal.iter().copied().max().unwrap_or_default()
    }

    pub fn status_ids(&self) -> BTreeSet<Uuid> {
        self.moodles.iter().flat_map(Moodle::status_ids).collect()
    }
}

/// First-wins accumulator used while walking contributors from highest to
/// lowest priority.
#[derive(Debug, Default)]
pub(crate) struct FirstWins {
    out: Contributions,
    seen_mods: BTreeSet<String>,
    seen_moodles: BTreeSet<Uuid>,
}

impl FirstWins {
    pub(crate) fn slot_taken(&self, slot: EquipSlot) -> bool {
        self.out.glamour.contains_key(&slot)
    }

    pub(crate) fn glamour(&mut self, glamour: GlamourItem) {
        self.out.glamour.entry(glamour.slot).or_insert(glamour);
    }

    pub(crate) fn mod_association(&mut self, association: &ModAssociation) {
        if association.preset.is_valid() && self.seen_mods.insert(association.key().to_owned()) {
            self.out.mods.push(association.clone());
        }
    }

    pub(crate) fn moodle(&mut self, moodle: &Moodle) {
        if moodle.is_valid() && self.seen_moodles.insert(moodle.id()) {
            self.out.moodles.push(moodle.clone());
        }
    }

    pub(crate) fn traits(&mut self, traits: Traits) {
        self.out.traits |= traits;
    }

    pub(crate) fn arousal(&mut self, arousal: Arousal) {
        if arousal != Arousal::None {
            self.out.arousal.push(arousal);
        }
    }

    /// Adds the facets of `item` selected by `flags`.
    ///
    /// `slot` is the equip slot the item is bound to; `stains` replaces the
    /// item's own dyes when set.
    pub(crate) fn restriction(
        &mut self,
        item: &RestrictionItem,
        slot: EquipSlot,
        flags: RestrictionFlags,
        stains: Option<StainIds>,
    ) {
        if flags.contains(RestrictionFlags::GLAMOUR) {
            if !self.slot_taken(slot) && !overlay_skip(&item.glamour, item.overlay) {
                let mut glamour = item.glamour.clone();
                glamour.slot = slot;
                if let Some(stains) = stains {
                    glamour.stains = stains;
                }
                self.glamour(glamour);
            }
            if self.out.blindfold.is_none() {
                self.out.blindfold = item.blindfold().cloned();
            }
            if self.out.hypnotic.is_none() {
                self.out.hypnotic = item.hypnotic().cloned();
            }
        }
        if flags.contains(RestrictionFlags::MOD) {
            if let Some(association) = &item.mods {
                self.mod_association(association);
            }
        }
        if flags.contains(RestrictionFlags::STATUS) {
            if let Some(moodle) = &item.moodle {
                self.moodle(moodle);
            }
        }
        if flags.contains(RestrictionFlags::TRAITS) {
            self.traits(item.traits);
        }
        if flags.contains(RestrictionFlags::AROUSAL) {
            self.arousal(item.arousal);
        }
    }

    pub(crate) fn finish(self) -> Contributions {
        self.out
    }
}

/// An overlay-only contributor whose glamour is the slot's "nothing"
/// placeholder is ignored so it does not hide whatever is underneath.
pub(crate) fn overlay_skip(glamour: &GlamourItem, overlay: bool) -> bool {
    overlay && glamour.is_nothing()
}
