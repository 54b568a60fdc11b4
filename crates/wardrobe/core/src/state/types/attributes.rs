//! Behavioral attributes contributed by restrictions: trait flags, arousal,
//! per-slot facet selection and headgear/visor meta toggles.

use bitflags::bitflags;

bitflags! {
    /// Hardcore trait flags a restriction imposes on its wearer.
    ///
    /// Traits accumulate: every contributing source ORs its bits in.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Traits: u16 {
        const GAGGED          = 1 << 0;
        const BLINDFOLDED     = 1 << 1;
        const IMMOBILE        = 1 << 2;
        const WEIGHTY         = 1 << 3;
        const ARMS_RESTRAINED = 1 << 4;
        const LEGS_RESTRAINED = 1 << 5;
    }
}

bitflags! {
    /// Selects which facets of a referenced restriction item apply in a slot
    /// or layer.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct RestrictionFlags: u8 {
        const GLAMOUR = 1 << 0;
        const MOD     = 1 << 1;
        const STATUS  = 1 << 2;
        const TRAITS  = 1 << 3;
        const AROUSAL = 1 << 4;
    }
}

impl Default for RestrictionFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Arousal intensity contributed by a restriction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Arousal {
    #[default]
    None,
    Light,
    Medium,
    Strong,
    Maximum,
}

/// Tri-state toggle: unset values leave earlier decisions alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptionalBool {
    #[default]
    Null,
    True,
    False,
}

impl OptionalBool {
    pub const fn is_set(self) -> bool {
        !matches!(self, Self::Null)
    }

    pub const fn value(self) -> Option<bool> {
        match self {
            Self::Null => None,
            Self::True => Some(true),
            Self::False => Some(false),
        }
    }

    /// Returns `later` if it is set, otherwise keeps `self`.
    pub const fn merge(self, later: Self) -> Self {
        if later.is_set() { later } else { self }
    }
}

impl From<bool> for OptionalBool {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

/// Headgear, visor and weapon visibility requested by a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetaFlags {
    pub headgear: OptionalBool,
    pub visor: OptionalBool,
    pub weapon: OptionalBool,
}

impl MetaFlags {
    pub const NONE: Self = Self {
        headgear: OptionalBool::Null,
        visor: OptionalBool::Null,
        weapon: OptionalBool::Null,
    };

    /// Overwrites every toggle that `later` sets.
    pub fn merge(&mut self, later: &MetaFlags) {
        self.headgear = self.headgear.merge(later.headgear);
        self.visor = self.visor.merge(later.visor);
        self.weapon = self.weapon.merge(later.weapon);
    }

    pub fn is_empty(&self) -> bool {
        !self.headgear.is_set() && !self.visor.is_set() && !self.weapon.is_set()
    }
}
