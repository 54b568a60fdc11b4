//! In-memory wardrobe repository for tests and local runs.

use std::sync::RwLock;

use uuid::Uuid;

use wardrobe_core::{CatalogSnapshot, CursedItem, RestraintEnsemble};

use super::types::ActiveSnapshot;
use super::{
    ActiveStateRepository, CatalogRepository, CursedPoolRepository, EnsembleRepository,
    RepositoryError, Result, StateCommitRepository,
};

#[derive(Debug, Default)]
struct Collections {
    ensembles: Vec<RestraintEnsemble>,
    enabled: Option<Uuid>,
    catalog: CatalogSnapshot,
    cursed: Vec<CursedItem>,
    active: ActiveSnapshot,
}

/// Keeps every collection behind one lock; saves replace the stored value.
#[derive(Debug, Default)]
pub struct InMemoryWardrobeRepo {
    inner: RwLock<Collections>,
}

impl InMemoryWardrobeRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with initial definitions and no active state.
    pub fn with_definitions(
        ensembles: Vec<RestraintEnsemble>,
        catalog: CatalogSnapshot,
        cursed: Vec<CursedItem>,
    ) -> Self {
        Self {
            inner: RwLock::new(Collections {
                ensembles,
                catalog,
                cursed,
                ..Collections::default()
            }),
        }
    }

    /// Id last written as the enabled ensemble.
    pub fn enabled_ensemble(&self) -> Result<Option<Uuid>> {
        let inner = self.inner.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(inner.enabled)
    }
}

impl EnsembleRepository for InMemoryWardrobeRepo {
    fn load_ensembles(&self) -> Result<Vec<RestraintEnsemble>> {
        let inner = self.inner.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(inner.ensembles.clone())
    }

    fn save_ensembles(&self, ensembles: &[RestraintEnsemble], active: Option<Uuid>) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| RepositoryError::LockPoisoned)?;
        inner.ensembles = ensembles.to_vec();
        inner.enabled = active;
        Ok(())
    }
}

impl CatalogRepository for InMemoryWardrobeRepo {
    fn load_catalog(&self) -> Result<CatalogSnapshot> {
        let inner = self.inner.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(inner.catalog.clone())
    }

    fn save_catalog(&self, catalog: &CatalogSnapshot) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| RepositoryError::LockPoisoned)?;
        inner.catalog = catalog.clone();
        Ok(())
    }
}

impl CursedPoolRepository for InMemoryWardrobeRepo {
    fn load_cursed(&self) -> Result<Vec<CursedItem>> {
        let inner = self.inner.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(inner.cursed.clone())
    }

    fn save_cursed(&self, items: &[CursedItem]) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| RepositoryError::LockPoisoned)?;
        inner.cursed = items.to_vec();
        Ok(())
    }
}

impl ActiveStateRepository for InMemoryWardrobeRepo {
    fn load_active(&self) -> Result<ActiveSnapshot> {
        let inner = self.inner.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(inner.active.clone())
    }

    fn save_active(&self, snapshot: &ActiveSnapshot) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| RepositoryError::LockPoisoned)?;
        inner.active = snapshot.clone();
        Ok(())
    }
}

impl StateCommitRepository for InMemoryWardrobeRepo {
    fn commit_state(
        &self,
        ensembles: &[RestraintEnsemble],
        cursed: &[CursedItem],
        active: &ActiveSnapshot,
    ) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| RepositoryError::LockPoisoned)?;
        inner.ensembles = ensembles.to_vec();
        inner.enabled = active.active.as_ref().map(|active| active.id);
        inner.cursed = cursed.to_vec();
        inner.active = active.clone();
        Ok(())
    }
}
