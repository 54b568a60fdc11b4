//! Cursed loot: pool-resident overlay items applied for a bounded time.

use std::fmt;

use uuid::Uuid;

use super::{GagType, Timestamp};

/// Numeric tie-break between cursed items competing for an equip slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Precedence(pub u8);

impl Precedence {
    pub const VERY_LOW: Self = Self(0);
    pub const LOW: Self = Self(1);
    pub const DEFAULT: Self = Self(2);
    pub const HIGH: Self = Self(3);
    pub const VERY_HIGH: Self = Self(4);
    pub const HIGHEST: Self = Self(5);
}

impl fmt::Display for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// What a cursed item puts on when it triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CursedKind {
    /// A mouth restriction; does not compete for equip slots.
    Gag(GagType),
    /// A restriction item, competing for its glamour's equip slot.
    Restriction(Uuid),
}

/// A cursed loot item.
///
/// `applied` and `release` are both `None` while the item sits inactive in
/// the pool, and both set while it occupies its target.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CursedItem {
    pub id: Uuid,
    pub label: String,
    pub in_pool: bool,
    pub applied: Option<Timestamp>,
    pub release: Option<Timestamp>,
    pub precedence: Precedence,
    /// Whether this item may be displaced once it holds a slot.
    pub can_override: bool,
    pub kind: CursedKind,
}

impl CursedItem {
    pub fn new(label: impl Into<String>, kind: CursedKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            in_pool: true,
            applied: None,
            release: None,
            precedence: Precedence::DEFAULT,
            can_override: false,
            kind,
        }
    }

    #[must_use]
    pub fn with_precedence(mut self, precedence: Precedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn is_active(&self) -> bool {
        self.applied.is_some()
    }

    /// Marks the item as occupying its target until `release`.
    ///
    /// Returns false (and leaves the item untouched) if `release` precedes
    /// `applied`.
    pub fn activate(&mut self, applied: Timestamp, release: Timestamp) -> bool {
        if release < applied {
            return false;
        }
        self.applied = Some(applied);
        self.release = Some(release);
        true
    }

    pub fn deactivate(&mut self) {
        self.applied = None;
        self.release = None;
    }

    /// True if active and the release time has been reached.
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.is_active() && self.release.is_some_and(|release| release <= now)
    }
}
