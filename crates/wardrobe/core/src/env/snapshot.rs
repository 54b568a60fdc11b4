//! Owned catalog backing both oracles.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::{GagOracle, RestrictionOracle};
use crate::state::{GagItem, GagType, RestrictionItem};

/// All restriction items and gag definitions known to the wardrobe.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatalogSnapshot {
    pub restrictions: BTreeMap<Uuid, RestrictionItem>,
    pub gags: BTreeMap<GagType, GagItem>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(
        restrictions: impl IntoIterator<Item = RestrictionItem>,
        gags: impl IntoIterator<Item = GagItem>,
    ) -> Self {
        Self {
            restrictions: restrictions.into_iter().map(|item| (item.id, item)).collect(),
            gags: gags.into_iter().map(|item| (item.gag, item)).collect(),
        }
    }

    #[must_use]
    pub fn with_restriction(mut self, item: RestrictionItem) -> Self {
        self.restrictions.insert(item.id, item);
        self
    }

    #[must_use]
    pub fn with_gag(mut self, item: GagItem) -> Self {
        self.gags.insert(item.gag, item);
        self
    }

    pub fn contains_restriction(&self, id: Uuid) -> bool {
        self.restrictions.contains_key(&id)
    }
}

impl RestrictionOracle for CatalogSnapshot {
    fn restriction(&self, id: Uuid) -> Option<&RestrictionItem> {
        self.restrictions.get(&id)
    }
}

impl GagOracle for CatalogSnapshot {
    fn gag_item(&self, gag: GagType) -> Option<&GagItem> {
        self.gags.get(&gag)
    }
}
