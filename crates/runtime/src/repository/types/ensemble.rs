//! Persisted shape of a restraint ensemble.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wardrobe_core::{
    AdvancedSlot, Arousal, BasicSlot, CustomizeProfile, EquipSlot, GlamourItem, Layer, MetaFlags,
    ModAssociation, ModPresetLayer, Moodle, RestraintEnsemble, RestrictionFlags, RestrictionLayer,
    SlotEntry, StainIds, Traits, WardrobeConfig,
};

/// Equip-slot entry, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SlotDocument {
    Basic {
        #[serde(default)]
        glamour: Option<GlamourItem>,
        #[serde(default)]
        overlay: bool,
    },
    Advanced {
        #[serde(default)]
        restriction: Uuid,
        #[serde(default)]
        flags: RestrictionFlags,
        #[serde(default)]
        stains: Option<StainIds>,
    },
}

impl SlotDocument {
    fn into_entry(self, slot: EquipSlot) -> SlotEntry {
        match self {
            SlotDocument::Basic { glamour, overlay } => SlotEntry::Basic(BasicSlot {
                glamour: glamour.unwrap_or_else(|| GlamourItem::nothing(slot)),
                overlay,
            }),
            SlotDocument::Advanced {
                restriction,
                flags,
                stains,
            } => SlotEntry::Advanced(AdvancedSlot {
                restriction,
                flags,
                stains,
            }),
        }
    }
}

impl From<&SlotEntry> for SlotDocument {
    fn from(entry: &SlotEntry) -> Self {
        match entry {
            SlotEntry::Basic(basic) => SlotDocument::Basic {
                glamour: Some(basic.glamour),
                overlay: basic.overlay,
            },
            SlotEntry::Advanced(advanced) => SlotDocument::Advanced {
                restriction: advanced.restriction,
                flags: advanced.flags,
                stains: advanced.stains,
            },
        }
    }
}

/// Ordered layer, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LayerDocument {
    Restriction {
        #[serde(default)]
        id: Uuid,
        #[serde(default)]
        label: String,
        #[serde(default)]
        restriction: Uuid,
        #[serde(default)]
        flags: RestrictionFlags,
        #[serde(default)]
        stains: Option<StainIds>,
    },
    ModPreset {
        #[serde(default)]
        id: Uuid,
        #[serde(default)]
        label: String,
        #[serde(default)]
        mod_preset: ModAssociation,
        #[serde(default)]
        arousal: Arousal,
    },
}

impl LayerDocument {
    fn into_layer(self) -> Layer {
        match self {
            LayerDocument::Restriction {
                id,
                label,
                restriction,
                flags,
                stains,
            } => Layer::Restriction(RestrictionLayer {
                id: id_or_new(id),
                label,
                restriction,
                flags,
                stains,
            }),
            LayerDocument::ModPreset {
                id,
                label,
                mod_preset,
                arousal,
            } => Layer::ModPreset(ModPresetLayer {
                id: id_or_new(id),
                label,
                mod_preset,
                arousal,
            }),
        }
    }
}

impl From<&Layer> for LayerDocument {
    fn from(layer: &Layer) -> Self {
        match layer {
            Layer::Restriction(l) => LayerDocument::Restriction {
                id: l.id,
                label: l.label.clone(),
                restriction: l.restriction,
                flags: l.flags,
                stains: l.stains,
            },
            Layer::ModPreset(l) => LayerDocument::ModPreset {
                id: l.id,
                label: l.label.clone(),
                mod_preset: l.mod_preset.clone(),
                arousal: l.arousal,
            },
        }
    }
}

/// Persisted ensemble.
///
/// `enabled` is written for readers of the file; on load the active state
/// document is authoritative.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleDocument {
    pub id: Uuid,
    pub label: String,
    pub description: String,
    pub enabled: bool,
    pub redraw: bool,
    pub slots: BTreeMap<EquipSlot, SlotDocument>,
    pub layers: Vec<LayerDocument>,
    pub meta: MetaFlags,
    pub traits: Traits,
    pub arousal: Arousal,
    pub mods: Vec<ModAssociation>,
    pub moodles: Vec<Moodle>,
    pub customize: Option<CustomizeProfile>,
}

impl EnsembleDocument {
    pub fn from_ensemble(ensemble: &RestraintEnsemble, enabled: bool) -> Self {
        Self {
            id: ensemble.id,
            label: ensemble.label.clone(),
            description: ensemble.description.clone(),
            enabled,
            redraw: ensemble.redraw,
            slots: ensemble
                .slots
                .iter()
                .map(|(slot, entry)| (*slot, SlotDocument::from(entry)))
                .collect(),
            layers: ensemble.layers.iter().map(LayerDocument::from).collect(),
            meta: ensemble.meta,
            traits: ensemble.traits,
            arousal: ensemble.arousal,
            mods: ensemble.mods.clone(),
            moodles: ensemble.moodles.clone(),
            customize: ensemble.customize,
        }
    }

    pub fn into_ensemble(self) -> RestraintEnsemble {
        let mut ensemble = RestraintEnsemble::new(self.label).with_id(id_or_new(self.id));
        ensemble.description = self.description;
        ensemble.redraw = self.redraw;
        ensemble.slots = self
            .slots
            .into_iter()
            .map(|(slot, doc)| (slot, doc.into_entry(slot)))
            .collect();
        if self.layers.len() > WardrobeConfig::MAX_LAYERS {
            tracing::warn!(
                ensemble = %ensemble.id,
                stored = self.layers.len(),
                limit = WardrobeConfig::MAX_LAYERS,
                "dropping layers past the limit"
            );
        }
        for layer in self.layers.into_iter().take(WardrobeConfig::MAX_LAYERS) {
            ensemble = ensemble.with_layer(layer.into_layer());
        }
        ensemble.meta = self.meta;
        ensemble.traits = self.traits;
        ensemble.arousal = self.arousal;
        ensemble.mods = self.mods;
        ensemble.moodles = self.moodles;
        ensemble.customize = self.customize;
        ensemble
    }
}

fn id_or_new(id: Uuid) -> Uuid {
    if id.is_nil() { Uuid::new_v4() } else { id }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wardrobe_core::{ItemId, ModPresetRef, OptionalBool};

    fn sample() -> RestraintEnsemble {
        let mut advanced = AdvancedSlot::new(Uuid::new_v4());
        advanced.flags = RestrictionFlags::GLAMOUR | RestrictionFlags::TRAITS;
        advanced.stains = Some(StainIds(2, 9));

        let mut ensemble = RestraintEnsemble::new("Shibari")
            .with_slot(
                EquipSlot::Body,
                SlotEntry::basic(GlamourItem::new(EquipSlot::Body, ItemId(31))),
            )
            .with_slot(EquipSlot::Hands, SlotEntry::Advanced(advanced))
            .with_layer(Layer::restriction(Uuid::new_v4()))
            .with_layer(Layer::mod_preset(
                ModAssociation::new(ModPresetRef::new("Rope", "tight")),
                Arousal::Strong,
            ));
        ensemble.meta.visor = OptionalBool::True;
        ensemble.traits = Traits::ARMS_RESTRAINED;
        ensemble.moodles.push(Moodle::Status(Uuid::new_v4()));
        ensemble
    }

    #[test]
    fn ensemble_survives_json() {
        let ensemble = sample();
        let document = EnsembleDocument::from_ensemble(&ensemble, true);
        let json = serde_json::to_string(&document).unwrap();
        let doc: EnsembleDocument = serde_json::from_str(&json).unwrap();
        assert!(doc.enabled);
        assert_eq!(doc.into_ensemble(), ensemble);
    }

    #[test]
    fn any_single_optional_field_may_be_missing() {
        let ensemble = sample();
        let document = EnsembleDocument::from_ensemble(&ensemble, false);
        let value = serde_json::to_value(document).unwrap();
        let fields: Vec<String> = value.as_object().unwrap().keys().cloned().collect();

        for field in fields {
            if field == "id" {
                continue;
            }
            let mut trimmed = value.clone();
            trimmed.as_object_mut().unwrap().remove(&field);
            let doc: EnsembleDocument = serde_json::from_value(trimmed)
                .unwrap_or_else(|err| panic!("dropping {field} failed: {err}"));
            assert_eq!(doc.into_ensemble().id, ensemble.id);
        }
    }

    #[test]
    fn layers_past_the_limit_are_dropped_on_load() {
        let ensemble = sample();
        let mut doc = EnsembleDocument::from_ensemble(&ensemble, false);
        while doc.layers.len() < WardrobeConfig::MAX_LAYERS + 2 {
            doc.layers
                .push(LayerDocument::from(&Layer::restriction(Uuid::new_v4())));
        }
        let kept: Vec<Uuid> = doc.layers[..WardrobeConfig::MAX_LAYERS]
            .iter()
            .map(|layer| layer.clone().into_layer().id())
            .collect();

        let loaded = doc.into_ensemble();
        assert_eq!(loaded.layers.len(), WardrobeConfig::MAX_LAYERS);
        let ids: Vec<Uuid> = loaded.layers.iter().map(Layer::id).collect();
        assert_eq!(ids, kept);
    }

    #[test]
    fn nested_fields_default_when_missing() {
        let json = r#"{
            "id": "6f1c1d2e-0c1b-4a57-9a4e-0b1f6f2d7a11",
            "slots": {
                "Head": { "type": "Basic" },
                "Feet": { "type": "Advanced" }
            },
            "layers": [ { "type": "ModPreset" } ]
        }"#;
        let ensemble = serde_json::from_str::<EnsembleDocument>(json)
            .unwrap()
            .into_ensemble();

        assert_eq!(
            ensemble.slots[&EquipSlot::Head],
            SlotEntry::basic(GlamourItem::nothing(EquipSlot::Head))
        );
        assert_eq!(
            ensemble.slots[&EquipSlot::Feet],
            SlotEntry::Advanced(AdvancedSlot::empty())
        );
        assert_eq!(ensemble.layers.len(), 1);
        assert!(!ensemble.layers[0].id().is_nil());
    }
}
