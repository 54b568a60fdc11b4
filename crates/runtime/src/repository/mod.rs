//! Repository layer for the wardrobe's persisted collections.
//!
//! Ensembles, restriction items, gag definitions, the cursed pool and the
//! active sub-state are stored as separate versioned collections. The
//! [`WardrobeStore`] turns them into one consistent [`wardrobe_core::WardrobeState`].

mod error;
mod file;
mod memory;
mod store;
mod traits;
pub mod types;

pub use error::{RepositoryError, Result};
pub use file::FileWardrobeRepository;
pub use memory::InMemoryWardrobeRepo;
pub use store::WardrobeStore;
pub use traits::{
    ActiveStateRepository, CatalogRepository, CursedPoolRepository, EnsembleRepository,
    StateCommitRepository, WardrobeRepository,
};
pub use types::ActiveSnapshot;
