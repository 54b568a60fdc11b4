use std::fmt;

use chrono::{DateTime, Utc};

/// Absolute point in time used for padlock timers and cursed item windows.
pub type Timestamp = DateTime<Utc>;

/// Identity of a user that enables, locks or unlocks something.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct UserUid(pub String);

impl UserUid {
    /// Reserved identity for timer expiry and cursed loot. Marks locks the
    /// system assigned; it carries no grants of its own.
    pub const SYSTEM: &'static str = "SYSTEM";

    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn system() -> Self {
        Self(Self::SYSTEM.to_owned())
    }

    #[inline]
    pub fn is_system(&self) -> bool {
        self.0 == Self::SYSTEM
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserUid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
