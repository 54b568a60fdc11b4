//! Read-only item catalog consulted during resolution.
//!
//! Ensembles, gag slots and cursed items only hold references to restriction
//! items and gag definitions. The oracles here turn those references back
//! into items; a missing item is not an error, callers treat it as an
//! empty contribution.
mod snapshot;

pub use snapshot::CatalogSnapshot;

use uuid::Uuid;

use crate::state::{GagItem, GagType, RestrictionItem};

/// Lookup of reusable restriction items by id.
pub trait RestrictionOracle: Send + Sync {
    fn restriction(&self, id: Uuid) -> Option<&RestrictionItem>;
}

/// Lookup of the visual definition of each gag type.
pub trait GagOracle: Send + Sync {
    fn gag_item(&self, gag: GagType) -> Option<&GagItem>;
}

/// Aggregates the oracles required by the resolvers and the aggregator.
#[derive(Clone, Copy)]
pub struct WardrobeEnv<'a> {
    restrictions: &'a dyn RestrictionOracle,
    gags: &'a dyn GagOracle,
}

impl<'a> WardrobeEnv<'a> {
    pub fn new(restrictions: &'a dyn RestrictionOracle, gags: &'a dyn GagOracle) -> Self {
        Self { restrictions, gags }
    }

    pub fn from_catalog(catalog: &'a CatalogSnapshot) -> Self {
        Self::new(catalog, catalog)
    }

    pub fn restriction(&self, id: Uuid) -> Option<&'a RestrictionItem> {
        self.restrictions.restriction(id)
    }

    pub fn gag_item(&self, gag: GagType) -> Option<&'a GagItem> {
        self.gags.gag_item(gag)
    }
}

impl std::fmt::Debug for WardrobeEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WardrobeEnv").finish_non_exhaustive()
    }
}
