//! Reusable restriction items referenced by ensemble slots, layers and
//! cursed items.

use uuid::Uuid;

use super::{Arousal, GlamourItem, ModAssociation, Moodle, Traits};

/// Screen overlay shown while a blindfold restriction is worn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlindfoldOverlay {
    pub texture: String,
    /// Opacity in percent.
    pub opacity: u8,
}

/// Animated overlay shown while a hypnotic restriction is worn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HypnoticOverlay {
    pub texture: String,
    pub phrases: Vec<String>,
}

/// What kind of restriction an item is; overlays only exist on their kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RestrictionKind {
    #[default]
    Normal,
    Blindfold(BlindfoldOverlay),
    Hypnotic(HypnoticOverlay),
}

/// An externally editable restriction item.
///
/// Ensembles bind to it by id through Advanced slots and Restriction layers;
/// edits to the item are picked up on the next recalculation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RestrictionItem {
    pub id: Uuid,
    pub label: String,
    pub glamour: GlamourItem,
    /// Only meant to layer over existing gear. A "nothing" glamour on an
    /// overlay item is skipped instead of blanking the slot.
    pub overlay: bool,
    pub kind: RestrictionKind,
    pub mods: Option<ModAssociation>,
    pub moodle: Option<Moodle>,
    pub traits: Traits,
    pub arousal: Arousal,
    pub redraw: bool,
}

impl RestrictionItem {
    pub fn new(label: impl Into<String>, glamour: GlamourItem) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            glamour,
            overlay: false,
            kind: RestrictionKind::Normal,
            mods: None,
            moodle: None,
            traits: Traits::empty(),
            arousal: Arousal::None,
            redraw: false,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: RestrictionKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_traits(mut self, traits: Traits) -> Self {
        self.traits = traits;
        self
    }

    #[must_use]
    pub fn with_arousal(mut self, arousal: Arousal) -> Self {
        self.arousal = arousal;
        self
    }

    #[must_use]
    pub fn with_mod(mut self, association: ModAssociation) -> Self {
        self.mods = Some(association);
        self
    }

    #[must_use]
    pub fn with_moodle(mut self, moodle: Moodle) -> Self {
        self.moodle = Some(moodle);
        self
    }

    #[must_use]
    pub fn as_overlay(mut self) -> Self {
        self.overlay = true;
        self
    }

    pub fn blindfold(&self) -> Option<&BlindfoldOverlay> {
        match &self.kind {
            RestrictionKind::Blindfold(overlay) => Some(overlay),
            _ => None,
        }
    }

    pub fn hypnotic(&self) -> Option<&HypnoticOverlay> {
        match &self.kind {
            RestrictionKind::Hypnotic(overlay) => Some(overlay),
            _ => None,
        }
    }
}
