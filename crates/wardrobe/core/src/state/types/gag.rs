//! Mouth-restriction types, their visual definitions and the slots they
//! occupy.

use uuid::Uuid;

use super::{
    Arousal, CustomizeProfile, GlamourItem, MetaFlags, ModAssociation, Moodle, PadlockState,
    Traits, UserUid,
};

/// Kind of gag; each kind has at most one visual definition.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GagType {
    BallGag,
    BitGag,
    ClothGag,
    ClothStuffing,
    DuctTape,
    Harness,
    LatexHood,
    MuzzleGag,
    PanelGag,
    Pacifier,
    PlugGag,
    RingGag,
    SpiderGag,
}

/// Visual and behavioral payload applied while a gag type is worn.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GagItem {
    pub gag: GagType,
    /// Visuals are applied only while enabled.
    pub enabled: bool,
    pub glamour: Option<GlamourItem>,
    pub mods: Option<ModAssociation>,
    pub moodle: Option<Moodle>,
    pub traits: Traits,
    pub arousal: Arousal,
    pub meta: MetaFlags,
    pub customize: Option<CustomizeProfile>,
    pub redraw: bool,
}

impl GagItem {
    pub fn new(gag: GagType) -> Self {
        Self {
            gag,
            enabled: true,
            glamour: None,
            mods: None,
            moodle: None,
            traits: Traits::GAGGED,
            arousal: Arousal::None,
            meta: MetaFlags::NONE,
            customize: None,
            redraw: false,
        }
    }

    #[must_use]
    pub fn with_glamour(mut self, glamour: GlamourItem) -> Self {
        self.glamour = Some(glamour);
        self
    }

    #[must_use]
    pub fn with_meta(mut self, meta: MetaFlags) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub fn with_moodle(mut self, moodle: Moodle) -> Self {
        self.moodle = Some(moodle);
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Status ids this gag expects to be applied.
    pub fn status_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.moodle.iter().flat_map(Moodle::status_ids)
    }
}

/// One of the mouth-restriction slots.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GagSlot {
    pub gag: Option<GagType>,
    pub enabler: Option<UserUid>,
    pub padlock: PadlockState,
}

impl GagSlot {
    pub fn with_gag(gag: GagType, enabler: UserUid) -> Self {
        Self {
            gag: Some(gag),
            enabler: Some(enabler),
            padlock: PadlockState::Unlocked,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.gag.is_none()
    }

    pub fn is_locked(&self) -> bool {
        self.padlock.is_locked()
    }
}
