//! Equipment slots and the glamour references placed into them.

use strum::{EnumCount, EnumIter, IntoEnumIterator};

/// Equipment slot a glamour item occupies on the character model.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    EnumCount,
    strum::Display,
    strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EquipSlot {
    Head,
    Body,
    Hands,
    Legs,
    Feet,
    Ears,
    Neck,
    Wrists,
    RFinger,
    LFinger,
}

impl EquipSlot {
    /// Iterates all slots in canonical order (armor first, then accessories).
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_accessory(self) -> bool {
        matches!(
            self,
            Self::Ears | Self::Neck | Self::Wrists | Self::RFinger | Self::LFinger
        )
    }
}

/// Game item identifier as understood by the equipment applicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ItemId(pub u64);

impl ItemId {
    /// Top of the reserved "nothing" range. Each slot gets its own id,
    /// counting down from here.
    const NOTHING_BASE: u64 = u64::MAX - 128;

    /// The slot's designated "nothing" placeholder (an empty, visible slot).
    pub const fn nothing(slot: EquipSlot) -> Self {
        Self(Self::NOTHING_BASE - slot as u64)
    }

    /// Returns true if this is the "nothing" placeholder of any slot.
    pub const fn is_nothing(self) -> bool {
        self.0 <= Self::NOTHING_BASE && self.0 > Self::NOTHING_BASE - EquipSlot::COUNT as u64
    }
}

/// Dye channels applied on top of an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StainIds(pub u8, pub u8);

impl StainIds {
    pub const NONE: Self = Self(0, 0);
}

/// A concrete item-in-slot reference with its dyes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlamourItem {
    pub slot: EquipSlot,
    pub item: ItemId,
    pub stains: StainIds,
}

impl GlamourItem {
    pub fn new(slot: EquipSlot, item: ItemId) -> Self {
        Self {
            slot,
            item,
            stains: StainIds::NONE,
        }
    }

    /// The slot's "nothing" placeholder with no dyes.
    pub fn nothing(slot: EquipSlot) -> Self {
        Self::new(slot, ItemId::nothing(slot))
    }

    #[must_use]
    pub fn with_stains(mut self, stains: StainIds) -> Self {
        self.stains = stains;
        self
    }

    pub fn is_nothing(&self) -> bool {
        self.item == ItemId::nothing(self.slot)
    }
}
