//! Unified error types surfaced by the runtime API.
//!
//! [`ApplyError`] is the reason code of a rejected pipeline operation;
//! [`RuntimeError`] wraps failures of the runtime itself (workers and
//! repositories).
use thiserror::Error;
use uuid::Uuid;

use wardrobe_core::{ErrorSeverity, GagType, LockError, UnlockError, WardrobeError};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("expiry worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Why a pipeline operation was rejected.
///
/// Every variant except [`ApplyError::Persistence`] is raised before any
/// state is touched.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("ensemble {0} not found")]
    EnsembleNotFound(Uuid),

    #[error("ensemble {0} is already active")]
    AlreadyActive(Uuid),

    #[error("no ensemble is active")]
    NoActiveEnsemble,

    #[error("the active ensemble is locked")]
    EnsembleLocked,

    #[error("gag slot {0} does not exist")]
    InvalidGagSlot(usize),

    #[error("gag slot {0} is empty")]
    GagSlotEmpty(usize),

    #[error("gag slot {0} is locked")]
    GagLocked(usize),

    #[error("gag slot {0} is already occupied")]
    GagSlotOccupied(usize),

    #[error("no free gag slot")]
    NoFreeGagSlot,

    #[error("{0} is already worn")]
    GagAlreadyWorn(GagType),

    #[error("gag slot {0} is held by a cursed item")]
    CursedGagSlot(usize),

    #[error("cursed item {0} not found")]
    CursedItemNotFound(Uuid),

    #[error("cursed item {0} is already applied")]
    CursedItemActive(Uuid),

    #[error("cursed item {0} is not applied")]
    CursedItemInactive(Uuid),

    #[error("release time precedes application time")]
    InvalidWindow,

    #[error("no inactive cursed item left in the pool")]
    PoolExhausted,

    #[error("restriction item {0} not found")]
    RestrictionNotFound(Uuid),

    #[error("enactor may not perform this operation")]
    PermissionDenied,

    #[error("enactor id `{0}` is reserved")]
    ReservedEnactor(String),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Unlock(#[from] UnlockError),

    #[error("failed to persist state")]
    Persistence(#[from] RepositoryError),
}

impl WardrobeError for ApplyError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Lock(err) => err.severity(),
            Self::Unlock(err) => err.severity(),
            Self::Persistence(_) => ErrorSeverity::Internal,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EnsembleNotFound(_) => "ENSEMBLE_NOT_FOUND",
            Self::AlreadyActive(_) => "ALREADY_ACTIVE",
            Self::NoActiveEnsemble => "NO_ACTIVE_ENSEMBLE",
            Self::EnsembleLocked => "ENSEMBLE_LOCKED",
            Self::InvalidGagSlot(_) => "INVALID_GAG_SLOT",
            Self::GagSlotEmpty(_) => "GAG_SLOT_EMPTY",
            Self::GagLocked(_) => "GAG_LOCKED",
            Self::GagSlotOccupied(_) => "GAG_SLOT_OCCUPIED",
            Self::NoFreeGagSlot => "NO_FREE_GAG_SLOT",
            Self::GagAlreadyWorn(_) => "GAG_ALREADY_WORN",
            Self::CursedGagSlot(_) => "CURSED_GAG_SLOT",
            Self::CursedItemNotFound(_) => "CURSED_ITEM_NOT_FOUND",
            Self::CursedItemActive(_) => "CURSED_ITEM_ACTIVE",
            Self::CursedItemInactive(_) => "CURSED_ITEM_INACTIVE",
            Self::InvalidWindow => "INVALID_WINDOW",
            Self::PoolExhausted => "POOL_EXHAUSTED",
            Self::RestrictionNotFound(_) => "RESTRICTION_NOT_FOUND",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::ReservedEnactor(_) => "RESERVED_ENACTOR",
            Self::Lock(err) => err.error_code(),
            Self::Unlock(err) => err.error_code(),
            Self::Persistence(_) => "PERSISTENCE_FAILED",
        }
    }
}
