//! Repository contracts for the wardrobe's persisted collections.
//!
//! Every save replaces the whole collection. Loads return domain values;
//! document parsing and defaulting happen inside the implementation.

use uuid::Uuid;

use wardrobe_core::{CatalogSnapshot, CursedItem, RestraintEnsemble};

use super::Result;
use super::types::ActiveSnapshot;

/// Ensemble definitions.
pub trait EnsembleRepository: Send + Sync {
    fn load_ensembles(&self) -> Result<Vec<RestraintEnsemble>>;

    /// `active` is written as each document's `enabled` flag for external
    /// readers. The active snapshot stays authoritative on load.
    fn save_ensembles(&self, ensembles: &[RestraintEnsemble], active: Option<Uuid>) -> Result<()>;
}

/// Restriction items and per-type gag definitions.
pub trait CatalogRepository: Send + Sync {
    fn load_catalog(&self) -> Result<CatalogSnapshot>;

    fn save_catalog(&self, catalog: &CatalogSnapshot) -> Result<()>;
}

/// The cursed loot pool, active and inactive items alike.
pub trait CursedPoolRepository: Send + Sync {
    fn load_cursed(&self) -> Result<Vec<CursedItem>>;

    fn save_cursed(&self, items: &[CursedItem]) -> Result<()>;
}

/// Active ensemble, gag slots and blindfold, with their locks.
pub trait ActiveStateRepository: Send + Sync {
    fn load_active(&self) -> Result<ActiveSnapshot>;

    fn save_active(&self, snapshot: &ActiveSnapshot) -> Result<()>;
}

/// Writes the collections a pipeline operation touches as one unit.
pub trait StateCommitRepository: Send + Sync {
    /// Replaces the ensemble, cursed and active collections together. On
    /// error none of them has changed.
    fn commit_state(
        &self,
        ensembles: &[RestraintEnsemble],
        cursed: &[CursedItem],
        active: &ActiveSnapshot,
    ) -> Result<()>;
}

/// Everything the apply pipeline persists.
pub trait WardrobeRepository:
    EnsembleRepository
    + CatalogRepository
    + CursedPoolRepository
    + ActiveStateRepository
    + StateCommitRepository
{
}

impl<T> WardrobeRepository for T where
    T: EnsembleRepository
        + CatalogRepository
        + CursedPoolRepository
        + ActiveStateRepository
        + StateCommitRepository
{
}
