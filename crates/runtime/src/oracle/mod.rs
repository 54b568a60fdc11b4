//! Runtime wrapper around the read-only item catalog.
//!
//! The catalog is loaded once from the repository and shared by the
//! pipeline and any reader that needs to resolve item references. Dynamic
//! state lives in [`wardrobe_core::WardrobeState`].

use std::sync::Arc;

use uuid::Uuid;

use wardrobe_core::{CatalogSnapshot, GagItem, GagType, RestrictionItem, WardrobeEnv};

/// Shared handle to the restriction and gag catalog.
#[derive(Clone, Debug, Default)]
pub struct CatalogManager {
    catalog: Arc<CatalogSnapshot>,
}

impl CatalogManager {
    pub fn new(catalog: CatalogSnapshot) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// Builds the oracle view the resolvers consume.
    pub fn as_env(&self) -> WardrobeEnv<'_> {
        WardrobeEnv::from_catalog(&self.catalog)
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.catalog
    }

    pub fn restriction(&self, id: Uuid) -> Option<&RestrictionItem> {
        self.catalog.restrictions.get(&id)
    }

    pub fn gag_item(&self, gag: GagType) -> Option<&GagItem> {
        self.catalog.gags.get(&gag)
    }
}

impl From<CatalogSnapshot> for CatalogManager {
    fn from(catalog: CatalogSnapshot) -> Self {
        Self::new(catalog)
    }
}
