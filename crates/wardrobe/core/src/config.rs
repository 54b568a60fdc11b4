//! Wardrobe configuration constants and tunable parameters.

use chrono::TimeDelta;

/// Compile-time limits shared by the domain model and the padlock rules,
/// plus the few defaults a runtime may override.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WardrobeConfig {
    /// Longest timer a padlock may be set to when the permission provider
    /// does not specify its own limit.
    pub default_max_lock_time: TimeDelta,
}

impl WardrobeConfig {
    // ===== compile-time constants =====
    /// Number of mouth-restriction slots, ordered inner (0) to outer (2).
    pub const GAG_SLOTS: usize = 3;
    /// Maximum number of layers an ensemble may carry.
    pub const MAX_LAYERS: usize = 5;
    /// Exact digit count of a combination padlock.
    pub const COMBINATION_LENGTH: usize = 4;
    /// Maximum length of an alphanumeric padlock password.
    pub const MAX_PASSWORD_LENGTH: usize = 20;
    /// Fixed duration of the five-minute padlock, in seconds.
    pub const FIVE_MINUTES_SECS: i64 = 5 * 60;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_LOCK_HOURS: i64 = 24 * 7;

    pub fn new() -> Self {
        Self {
            default_max_lock_time: TimeDelta::hours(Self::DEFAULT_MAX_LOCK_HOURS),
        }
    }

    pub fn with_max_lock_time(default_max_lock_time: TimeDelta) -> Self {
        Self {
            default_max_lock_time,
        }
    }

    /// Duration applied by [`crate::Padlock::FiveMinutes`].
    pub fn five_minutes() -> TimeDelta {
        TimeDelta::seconds(Self::FIVE_MINUTES_SECS)
    }
}

impl Default for WardrobeConfig {
    fn default() -> Self {
        Self::new()
    }
}
