//! Restraint ensembles: base equip-slot entries plus ordered override layers.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::{
    Arousal, CustomizeProfile, EquipSlot, GlamourItem, MetaFlags, ModAssociation, Moodle,
    PadlockState, RestrictionFlags, StainIds, Traits, UserUid,
};
use crate::config::WardrobeConfig;

/// A slot bound to an inline glamour value.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BasicSlot {
    pub glamour: GlamourItem,
    pub overlay: bool,
}

/// A slot bound by reference to a restriction item.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdvancedSlot {
    /// Referenced restriction item; nil marks an explicitly empty entry.
    pub restriction: Uuid,
    pub flags: RestrictionFlags,
    /// Replaces the restriction item's own dyes when set.
    pub stains: Option<StainIds>,
}

impl AdvancedSlot {
    pub fn new(restriction: Uuid) -> Self {
        Self {
            restriction,
            flags: RestrictionFlags::all(),
            stains: None,
        }
    }

    /// An entry that references nothing and contributes nothing.
    pub fn empty() -> Self {
        Self::new(Uuid::nil())
    }

    pub fn is_empty(&self) -> bool {
        self.restriction.is_nil()
    }
}

/// Base entry of an ensemble's equip slot.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SlotEntry {
    Basic(BasicSlot),
    Advanced(AdvancedSlot),
}

impl SlotEntry {
    pub fn basic(glamour: GlamourItem) -> Self {
        SlotEntry::Basic(BasicSlot {
            glamour,
            overlay: false,
        })
    }

    pub fn advanced(restriction: Uuid) -> Self {
        SlotEntry::Advanced(AdvancedSlot::new(restriction))
    }
}

/// Layer that binds a restriction item, with its own facet flags and dyes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RestrictionLayer {
    pub id: Uuid,
    pub label: String,
    pub restriction: Uuid,
    pub flags: RestrictionFlags,
    pub stains: Option<StainIds>,
}

/// Layer that toggles a companion-mod preset and adds arousal.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModPresetLayer {
    pub id: Uuid,
    pub label: String,
    pub mod_preset: ModAssociation,
    pub arousal: Arousal,
}

/// An ordered override contributor within an ensemble.
///
/// Higher indices win equip-slot conflicts against lower ones.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Layer {
    Restriction(RestrictionLayer),
    ModPreset(ModPresetLayer),
}

impl Layer {
    pub fn restriction(restriction: Uuid) -> Self {
        Layer::Restriction(RestrictionLayer {
            id: Uuid::new_v4(),
            label: String::new(),
            restriction,
            flags: RestrictionFlags::all(),
            stains: None,
        })
    }

    pub fn mod_preset(mod_preset: ModAssociation, arousal: Arousal) -> Self {
        Layer::ModPreset(ModPresetLayer {
            id: Uuid::new_v4(),
            label: String::new(),
            mod_preset,
            arousal,
        })
    }

    pub fn id(&self) -> Uuid {
        match self {
            Layer::Restriction(layer) => layer.id,
            Layer::ModPreset(layer) => layer.id,
        }
    }
}

/// Bitset of layer indices currently in effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct LayerSelection(pub u32);

impl LayerSelection {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        indices.into_iter().fold(Self::NONE, |sel, i| sel.with(i))
    }

    #[must_use]
    pub fn with(self, index: usize) -> Self {
        if index < u32::BITS as usize {
            Self(self.0 | (1 << index))
        } else {
            self
        }
    }

    pub fn contains(self, index: usize) -> bool {
        index < u32::BITS as usize && self.0 & (1 << index) != 0
    }

    /// Drops bits beyond `layer_count`.
    #[must_use]
    pub fn clamp(self, layer_count: usize) -> Self {
        if layer_count >= u32::BITS as usize {
            self
        } else {
            Self(self.0 & ((1u32 << layer_count) - 1))
        }
    }
}

/// The restraint ensemble aggregate.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RestraintEnsemble {
    pub id: Uuid,
    pub label: String,
    pub description: String,
    pub redraw: bool,
    pub slots: BTreeMap<EquipSlot, SlotEntry>,
    pub layers: Vec<Layer>,
    pub meta: MetaFlags,
    pub traits: Traits,
    pub arousal: Arousal,
    pub mods: Vec<ModAssociation>,
    pub moodles: Vec<Moodle>,
    pub customize: Option<CustomizeProfile>,
}

impl RestraintEnsemble {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            description: String::new(),
            redraw: false,
            slots: BTreeMap::new(),
            layers: Vec::new(),
            meta: MetaFlags::NONE,
            traits: Traits::empty(),
            arousal: Arousal::None,
            mods: Vec::new(),
            moodles: Vec::new(),
            customize: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_slot(mut self, slot: EquipSlot, entry: SlotEntry) -> Self {
        self.slots.insert(slot, entry);
        self
    }

    /// Appends a layer; layers beyond [`WardrobeConfig::MAX_LAYERS`] are dropped.
    #[must_use]
    pub fn with_layer(mut self, layer: Layer) -> Self {
        if self.layers.len() < WardrobeConfig::MAX_LAYERS {
            self.layers.push(layer);
        }
        self
    }

    pub fn layer_index(&self, id: Uuid) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id() == id)
    }

    /// Moves a layer to `to`, keeping the relative order of the others.
    pub fn move_layer(&mut self, id: Uuid, to: usize) -> bool {
        let Some(from) = self.layer_index(id) else {
            return false;
        };
        let layer = self.layers.remove(from);
        let to = to.min(self.layers.len());
        self.layers.insert(to, layer);
        true
    }

    /// Ids of all restriction items this ensemble references.
    pub fn referenced_restrictions(&self) -> impl Iterator<Item = Uuid> + '_ {
        let from_slots = self.slots.values().filter_map(|entry| match entry {
            SlotEntry::Advanced(adv) if !adv.is_empty() => Some(adv.restriction),
            _ => None,
        });
        let from_layers = self.layers.iter().filter_map(|layer| match layer {
            Layer::Restriction(l) if !l.restriction.is_nil() => Some(l.restriction),
            _ => None,
        });
        from_slots.chain(from_layers)
    }
}

/// The one ensemble currently enabled, with its lock and layer selection.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveEnsemble {
    pub id: Uuid,
    pub enabler: UserUid,
    pub padlock: PadlockState,
    pub layers: LayerSelection,
}

impl ActiveEnsemble {
    pub fn new(id: Uuid, enabler: UserUid) -> Self {
        Self {
            id,
            enabler,
            padlock: PadlockState::Unlocked,
            layers: LayerSelection::NONE,
        }
    }

    #[must_use]
    pub fn with_layers(mut self, layers: LayerSelection) -> Self {
        self.layers = layers;
        self
    }
}
