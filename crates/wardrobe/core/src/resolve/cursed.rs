//! Per-slot conflict resolution among active cursed items.

use std::collections::BTreeMap;

use tracing::{trace, warn};

use crate::env::WardrobeEnv;
use crate::state::{CursedItem, CursedKind, EquipSlot, GagType};

/// Winners of the active cursed pool.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolResolution<'a> {
    /// Winning restriction-kind item per equip slot.
    pub slots: BTreeMap<EquipSlot, &'a CursedItem>,
    /// Gag-kind items, oldest first. These never compete for equip slots.
    pub gags: Vec<(&'a CursedItem, GagType)>,
}

impl PoolResolution<'_> {
    pub fn winner(&self, slot: EquipSlot) -> Option<&CursedItem> {
        self.slots.get(&slot).copied()
    }
}

/// Whether `challenger` displaces `incumbent` from a slot.
///
/// Only an override-eligible incumbent can be displaced, and a challenger
/// of equal precedence takes the slot.
pub fn displaces(incumbent: &CursedItem, challenger: &CursedItem) -> bool {
    incumbent.can_override && challenger.precedence >= incumbent.precedence
}

/// Resolves the active subset of `pool`, processing items in ascending
/// application time.
pub fn resolve_pool<'a>(pool: &'a [CursedItem], env: &WardrobeEnv<'_>) -> PoolResolution<'a> {
    resolve_with(pool, |restriction| {
        let slot = env.restriction(restriction).map(|item| item.glamour.slot);
        if slot.is_none() {
            warn!(%restriction, "cursed item references a missing restriction item; skipping");
        }
        slot
    })
}

/// Same as [`resolve_pool`] with the restriction-to-slot lookup supplied
/// by the caller.
pub fn resolve_with<'a>(
    pool: &'a [CursedItem],
    mut slot_of: impl FnMut(uuid::Uuid) -> Option<EquipSlot>,
) -> PoolResolution<'a> {
    let mut active: Vec<&CursedItem> = pool.iter().filter(|item| item.is_active()).collect();
    active.sort_by_key(|item| (item.applied, item.id));

    let mut resolution = PoolResolution::default();
    for item in active {
        let restriction = match item.kind {
            CursedKind::Gag(gag) => {
                resolution.gags.push((item, gag));
                continue;
            }
            CursedKind::Restriction(restriction) => restriction,
        };
        let Some(slot) = slot_of(restriction) else {
            continue;
        };

        match resolution.slots.get(&slot) {
            None => {
                resolution.slots.insert(slot, item);
            }
            Some(incumbent) if displaces(incumbent, item) => {
                trace!(%slot, winner = %item.id, loser = %incumbent.id, "cursed item displaced");
                resolution.slots.insert(slot, item);
            }
            Some(_) => {}
        }
    }
    resolution
}
