//! Error types raised by repository implementations.

use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("wardrobe repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("collection {collection} has schema version {found}, newer than supported")]
    UnsupportedVersion { collection: String, found: u32 },
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
