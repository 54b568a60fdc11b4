//! Common error infrastructure for wardrobe-core.
//!
//! Domain-specific errors (`LockError`, `UnlockError`, `TimerError`) live
//! next to the state machine that raises them. This module holds the shared
//! classification used by callers to decide how loudly to report a failure.

/// Severity level of an error, used for categorization and logging level.
///
/// - **Validation**: a precondition was not met; nothing was mutated
/// - **Internal**: state that should be impossible was observed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Invalid request; reject without retrying.
    ///
    /// Examples: wrong password, timer not yet elapsed, missing permission
    Validation,

    /// Unexpected state inconsistency that should be investigated.
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    /// Returns true if this error indicates a bug rather than a rejected request.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Common trait for all wardrobe-core errors.
///
/// Implementations should use `#[derive(thiserror::Error)]` for `Display` and
/// classify severity by recoverability, not by impact.
pub trait WardrobeError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a stable identifier for this error variant.
    ///
    /// Used as the reason code reported to callers and in structured logs.
    fn error_code(&self) -> &'static str;
}
