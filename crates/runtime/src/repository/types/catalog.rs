//! Persisted shapes of restriction items and gag definitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wardrobe_core::{
    Arousal, CustomizeProfile, GagItem, GagType, GlamourItem, MetaFlags, ModAssociation, Moodle,
    RestrictionItem, RestrictionKind, Traits,
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RestrictionDocument {
    pub id: Uuid,
    pub label: String,
    pub glamour: Option<GlamourItem>,
    pub overlay: bool,
    pub kind: RestrictionKind,
    pub mods: Option<ModAssociation>,
    pub moodle: Option<Moodle>,
    pub traits: Traits,
    pub arousal: Arousal,
    pub redraw: bool,
}

impl From<&RestrictionItem> for RestrictionDocument {
    fn from(item: &RestrictionItem) -> Self {
        Self {
            id: item.id,
            label: item.label.clone(),
            glamour: Some(item.glamour),
            overlay: item.overlay,
            kind: item.kind.clone(),
            mods: item.mods.clone(),
            moodle: item.moodle.clone(),
            traits: item.traits,
            arousal: item.arousal,
            redraw: item.redraw,
        }
    }
}

impl RestrictionDocument {
    /// Items without an id or glamour cannot be referenced or worn and are
    /// dropped.
    pub fn into_item(self) -> Option<RestrictionItem> {
        if self.id.is_nil() {
            tracing::warn!(label = %self.label, "restriction item without id dropped");
            return None;
        }
        let Some(glamour) = self.glamour else {
            tracing::warn!(id = %self.id, "restriction item without glamour dropped");
            return None;
        };
        Some(RestrictionItem {
            id: self.id,
            label: self.label,
            glamour,
            overlay: self.overlay,
            kind: self.kind,
            mods: self.mods,
            moodle: self.moodle,
            traits: self.traits,
            arousal: self.arousal,
            redraw: self.redraw,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GagItemDocument {
    pub gag: GagType,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub glamour: Option<GlamourItem>,
    #[serde(default)]
    pub mods: Option<ModAssociation>,
    #[serde(default)]
    pub moodle: Option<Moodle>,
    #[serde(default = "gagged")]
    pub traits: Traits,
    #[serde(default)]
    pub arousal: Arousal,
    #[serde(default)]
    pub meta: MetaFlags,
    #[serde(default)]
    pub customize: Option<CustomizeProfile>,
    #[serde(default)]
    pub redraw: bool,
}

fn enabled_by_default() -> bool {
    true
}

fn gagged() -> Traits {
    Traits::GAGGED
}

impl From<&GagItem> for GagItemDocument {
    fn from(item: &GagItem) -> Self {
        Self {
            gag: item.gag,
            enabled: item.enabled,
            glamour: item.glamour,
            mods: item.mods.clone(),
            moodle: item.moodle.clone(),
            traits: item.traits,
            arousal: item.arousal,
            meta: item.meta,
            customize: item.customize,
            redraw: item.redraw,
        }
    }
}

impl From<GagItemDocument> for GagItem {
    fn from(doc: GagItemDocument) -> Self {
        GagItem {
            gag: doc.gag,
            enabled: doc.enabled,
            glamour: doc.glamour,
            mods: doc.mods,
            moodle: doc.moodle,
            traits: doc.traits,
            arousal: doc.arousal,
            meta: doc.meta,
            customize: doc.customize,
            redraw: doc.redraw,
        }
    }
}
