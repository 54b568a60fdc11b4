//! Layer and slot resolution for a single ensemble.
//!
//! Selected layers are walked from the highest index down, then the base
//! slots. Equipment, mods and statuses keep the first contribution seen per
//! slot or identity; traits and arousal accumulate from every contributor;
//! blindfold and hypnotic overlays are first-match.

use tracing::warn;

use super::contribution::{Contributions, FirstWins, overlay_skip};
use crate::env::WardrobeEnv;
use crate::state::{Layer, LayerSelection, RestraintEnsemble, RestrictionItem, SlotEntry};

/// Resolves ensembles against the item catalog.
#[derive(Clone, Copy, Debug)]
pub struct LayerResolver<'a> {
    env: WardrobeEnv<'a>,
}

impl<'a> LayerResolver<'a> {
    pub fn new(env: WardrobeEnv<'a>) -> Self {
        Self { env }
    }

    /// Resolves `ensemble` with the layers in `selection` in effect.
    pub fn resolve(
        &self,
        ensemble: &RestraintEnsemble,
        selection: LayerSelection,
    ) -> Contributions {
        let mut acc = FirstWins::default();
        let selection = selection.clamp(ensemble.layers.len());

        for (index, layer) in ensemble.layers.iter().enumerate().rev() {
            if !selection.contains(index) {
                continue;
            }
            match layer {
                Layer::Restriction(layer) => {
                    let Some(item) = self.lookup(ensemble, layer.restriction) else {
                        continue;
                    };
                    acc.restriction(item, item.glamour.slot, layer.flags, layer.stains);
                }
                Layer::ModPreset(layer) => {
                    acc.mod_association(&layer.mod_preset);
                    acc.arousal(layer.arousal);
                }
            }
        }

        for (&slot, entry) in &ensemble.slots {
            match entry {
                SlotEntry::Basic(basic) => {
                    if acc.slot_taken(slot) || overlay_skip(&basic.glamour, basic.overlay) {
                        continue;
                    }
                    let mut glamour = basic.glamour.clone();
                    glamour.slot = slot;
                    acc.glamour(glamour);
                }
                SlotEntry::Advanced(advanced) => {
                    if advanced.is_empty() {
                        continue;
                    }
                    let Some(item) = self.lookup(ensemble, advanced.restriction) else {
                        continue;
                    };
                    acc.restriction(item, slot, advanced.flags, advanced.stains);
                }
            }
        }

        for association in &ensemble.mods {
            acc.mod_association(association);
        }
        for moodle in &ensemble.moodles {
            acc.moodle(moodle);
        }
        acc.traits(ensemble.traits);
        acc.arousal(ensemble.arousal);

        acc.finish()
    }

    fn lookup(&self, ensemble: &RestraintEnsemble, id: uuid::Uuid) -> Option<&'a RestrictionItem> {
        let item = self.env.restriction(id);
        if item.is_none() {
            warn!(
                ensemble = %ensemble.id,
                restriction = %id,
                "ensemble references a missing restriction item; skipping"
            );
        }
        item
    }
}
