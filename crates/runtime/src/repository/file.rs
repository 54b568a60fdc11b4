//! File-based wardrobe repository.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use wardrobe_core::{CatalogSnapshot, CursedItem, RestraintEnsemble};

use super::types::{
    ActiveDocument, ActiveSnapshot, Collection, CursedDocument, EnsembleDocument,
    GagItemDocument, RestrictionDocument, SCHEMA_VERSION, parse_collection,
};
use super::{
    ActiveStateRepository, CatalogRepository, CursedPoolRepository, EnsembleRepository,
    RepositoryError, Result, StateCommitRepository,
};

const ENSEMBLES: &str = "ensembles";
const RESTRICTIONS: &str = "restrictions";
const GAGS: &str = "gags";
const CURSED: &str = "cursed";
const ACTIVE: &str = "active";

/// Stores each collection as `<collection>.json` under one directory.
///
/// Saves write `<collection>.json.tmp` and rename it over the previous file,
/// so a reader never sees a partially written collection. A state commit
/// stages every temp file first and renames only once all of them are
/// written. A missing file loads as an empty collection.
#[derive(Debug, Clone)]
pub struct FileWardrobeRepository {
    base_dir: PathBuf,
}

impl FileWardrobeRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn path(&self, collection: &str) -> PathBuf {
        self.base_dir.join(format!("{collection}.json"))
    }

    fn read(&self, collection: &str) -> Result<Option<String>> {
        let path = self.path(collection);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        tracing::debug!("Loaded {} from {}", collection, path.display());
        Ok(Some(json))
    }

    /// Writes `value` next to its collection file and returns the staged
    /// temp path with its final path.
    fn stage<T: Serialize>(&self, collection: &str, value: &T) -> Result<Staged> {
        let path = self.path(collection);
        let temp_path = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(value)?;
        fs::write(&temp_path, bytes)?;
        Ok(Staged { temp_path, path })
    }

    fn write<T: Serialize>(&self, collection: &str, value: &T) -> Result<()> {
        self.stage(collection, value)?.publish()?;
        tracing::debug!("Saved {}", collection);
        Ok(())
    }

    fn read_collection<T: serde::de::DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        match self.read(collection)? {
            Some(json) => parse_collection(collection, &json),
            None => Ok(Vec::new()),
        }
    }
}

/// A written temp file waiting to replace its collection.
struct Staged {
    temp_path: PathBuf,
    path: PathBuf,
}

impl Staged {
    fn publish(self) -> Result<()> {
        fs::rename(&self.temp_path, &self.path)?;
        Ok(())
    }

    fn discard(self) {
        if let Err(err) = fs::remove_file(&self.temp_path) {
            tracing::warn!(
                path = %self.temp_path.display(),
                error = %err,
                "could not remove staged file"
            );
        }
    }
}

fn ensemble_collection(
    ensembles: &[RestraintEnsemble],
    active: Option<Uuid>,
) -> Collection<EnsembleDocument> {
    Collection::new(
        ensembles
            .iter()
            .map(|ensemble| EnsembleDocument::from_ensemble(ensemble, active == Some(ensemble.id)))
            .collect(),
    )
}

fn cursed_collection(items: &[CursedItem]) -> Collection<CursedDocument> {
    Collection::new(items.iter().map(CursedDocument::from).collect())
}

impl EnsembleRepository for FileWardrobeRepository {
    fn load_ensembles(&self) -> Result<Vec<RestraintEnsemble>> {
        let documents: Vec<EnsembleDocument> = self.read_collection(ENSEMBLES)?;
        Ok(documents
            .into_iter()
            .map(EnsembleDocument::into_ensemble)
            .collect())
    }

    fn save_ensembles(&self, ensembles: &[RestraintEnsemble], active: Option<Uuid>) -> Result<()> {
        self.write(ENSEMBLES, &ensemble_collection(ensembles, active))
    }
}

impl CatalogRepository for FileWardrobeRepository {
    fn load_catalog(&self) -> Result<CatalogSnapshot> {
        let restrictions: Vec<RestrictionDocument> = self.read_collection(RESTRICTIONS)?;
        let gags: Vec<GagItemDocument> = self.read_collection(GAGS)?;
        Ok(CatalogSnapshot::from_items(
            restrictions
                .into_iter()
                .filter_map(RestrictionDocument::into_item),
            gags.into_iter().map(Into::into),
        ))
    }

    fn save_catalog(&self, catalog: &CatalogSnapshot) -> Result<()> {
        let restrictions = catalog
            .restrictions
            .values()
            .map(RestrictionDocument::from)
            .collect();
        let gags = catalog.gags.values().map(GagItemDocument::from).collect();
        self.write(RESTRICTIONS, &Collection::<RestrictionDocument>::new(restrictions))?;
        self.write(GAGS, &Collection::<GagItemDocument>::new(gags))
    }
}

impl CursedPoolRepository for FileWardrobeRepository {
    fn load_cursed(&self) -> Result<Vec<CursedItem>> {
        let documents: Vec<CursedDocument> = self.read_collection(CURSED)?;
        Ok(documents
            .into_iter()
            .filter_map(CursedDocument::into_item)
            .collect())
    }

    fn save_cursed(&self, items: &[CursedItem]) -> Result<()> {
        self.write(CURSED, &cursed_collection(items))
    }
}

impl ActiveStateRepository for FileWardrobeRepository {
    fn load_active(&self) -> Result<ActiveSnapshot> {
        let Some(json) = self.read(ACTIVE)? else {
            return Ok(ActiveSnapshot::default());
        };
        let document: ActiveDocument = serde_json::from_str(&json)?;
        if document.version > SCHEMA_VERSION {
            return Err(RepositoryError::UnsupportedVersion {
                collection: ACTIVE.to_owned(),
                found: document.version,
            });
        }
        Ok(document.into_snapshot())
    }

    fn save_active(&self, snapshot: &ActiveSnapshot) -> Result<()> {
        self.write(ACTIVE, &ActiveDocument::from(snapshot))
    }
}

impl StateCommitRepository for FileWardrobeRepository {
    fn commit_state(
        &self,
        ensembles: &[RestraintEnsemble],
        cursed: &[CursedItem],
        active: &ActiveSnapshot,
    ) -> Result<()> {
        let enabled = active.active.as_ref().map(|active| active.id);
        let results = [
            self.stage(ENSEMBLES, &ensemble_collection(ensembles, enabled)),
            self.stage(CURSED, &cursed_collection(cursed)),
            self.stage(ACTIVE, &ActiveDocument::from(active)),
        ];

        let mut staged = Vec::with_capacity(results.len());
        let mut failure = None;
        for result in results {
            match result {
                Ok(file) => staged.push(file),
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }
        }
        if let Some(err) = failure {
            staged.into_iter().for_each(Staged::discard);
            return Err(err);
        }

        for file in staged {
            file.publish()?;
        }
        tracing::debug!("Committed wardrobe state to {}", self.base_dir.display());
        Ok(())
    }
}
