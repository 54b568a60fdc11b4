//! Random selection of cursed loot.

use std::time::Duration;

use chrono::TimeDelta;
use rand::Rng;
use rand::seq::SliceRandom;
use uuid::Uuid;

use wardrobe_core::{CursedItem, CursedKind, Timestamp, WardrobeState};

/// Bounds of a rolled cursed item's duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursedLootConfig {
    pub min_duration: Duration,
    pub max_duration: Duration,
}

impl Default for CursedLootConfig {
    fn default() -> Self {
        Self {
            min_duration: Duration::from_secs(15 * 60),
            max_duration: Duration::from_secs(2 * 60 * 60),
        }
    }
}

/// Picks an inactive pool item and a release time within the configured
/// bounds. Gag items are only candidates while a slot can take them.
/// Returns `None` when nothing can be applied or the release time is not
/// representable.
pub fn roll<R: Rng + ?Sized>(
    state: &WardrobeState,
    config: &CursedLootConfig,
    now: Timestamp,
    rng: &mut R,
) -> Option<(Uuid, Timestamp)> {
    let candidates: Vec<Uuid> = state
        .cursed
        .iter()
        .filter(|item| item.in_pool && !item.is_active() && placeable(state, item))
        .map(|item| item.id)
        .collect();
    let id = *candidates.choose(rng)?;

    let min = config.min_duration.as_secs();
    let max = config.max_duration.as_secs().max(min);
    let secs = rng.gen_range(min..=max);
    let release = i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|duration| now.checked_add_signed(duration))?;
    Some((id, release))
}

fn placeable(state: &WardrobeState, item: &CursedItem) -> bool {
    match item.kind {
        CursedKind::Restriction(_) => true,
        CursedKind::Gag(gag) => {
            state.first_free_gag_slot().is_some()
                && state.gags.iter().all(|slot| slot.gag != Some(gag))
        }
    }
}
