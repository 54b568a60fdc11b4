//! Failure reasons reported by padlock transitions.
//!
//! A failed transition never mutates the target.

use chrono::TimeDelta;
use thiserror::Error;

use super::timer::TimerError;
use crate::error::{ErrorSeverity, WardrobeError};
use crate::state::Padlock;

/// Why a lock attempt was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("target is already locked")]
    AlreadyLocked,

    #[error("enactor may not lock this target")]
    PermissionDenied,

    #[error("padlock {0} is not permitted on this target")]
    PadlockNotPermitted(Padlock),

    #[error("password does not satisfy the {0} padlock format")]
    BadPasswordFormat(Padlock),

    #[error("invalid timer: {0}")]
    BadTimer(#[from] TimerError),
}

impl WardrobeError for LockError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyLocked => "ALREADY_LOCKED",
            Self::PermissionDenied => "LOCK_PERMISSION_DENIED",
            Self::PadlockNotPermitted(_) => "PADLOCK_NOT_PERMITTED",
            Self::BadPasswordFormat(_) => "BAD_PASSWORD_FORMAT",
            Self::BadTimer(_) => "BAD_TIMER",
        }
    }
}

/// Why an unlock attempt was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UnlockError {
    #[error("target is not locked")]
    NotLocked,

    #[error("password does not match")]
    WrongPassword,

    #[error("timer has not expired ({remaining_secs}s remaining)")]
    NotYetExpired { remaining_secs: i64 },

    #[error("enactor may not unlock this target")]
    NoPermission,
}

impl UnlockError {
    pub(crate) fn not_yet_expired(remaining: TimeDelta) -> Self {
        Self::NotYetExpired {
            remaining_secs: remaining.num_seconds().max(0),
        }
    }
}

impl WardrobeError for UnlockError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotLocked => "NOT_LOCKED",
            Self::WrongPassword => "WRONG_PASSWORD",
            Self::NotYetExpired { .. } => "NOT_YET_EXPIRED",
            Self::NoPermission => "UNLOCK_NO_PERMISSION",
        }
    }
}
