//! Fake collaborators and fixtures shared by the integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeZone;
use uuid::Uuid;

use wardrobe_core::{
    CatalogSnapshot, CursedItem, CursedKind, EquipSlot, GagItem, GagType, GlamourItem, ItemId,
    MetaFlags, ModAssociation, ModPresetRef, Moodle, RestraintEnsemble, RestrictionItem,
    SlotEntry, Timestamp, WardrobeState,
};
use wardrobe_runtime::{
    ApplyPipeline, Clock, CollaboratorError, CollaboratorResult, Collaborators,
    EquipmentApplicator, EventBus, InMemoryWardrobeRepo, ModToggleService, OwnerOnly,
    PipelineConfig, PipelineDeps, RedrawWaitConfig, StatusEffectService, WardrobeStore,
};

pub fn t0() -> Timestamp {
    chrono::Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Records every slot map it is asked to apply.
#[derive(Default)]
pub struct RecordingEquipment {
    pub applied: Mutex<Vec<BTreeMap<EquipSlot, GlamourItem>>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl EquipmentApplicator for RecordingEquipment {
    async fn apply(
        &self,
        glamour: &BTreeMap<EquipSlot, GlamourItem>,
        _meta: &MetaFlags,
    ) -> CollaboratorResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Unavailable("glamour plugin offline".into()));
        }
        self.applied.lock().unwrap().push(glamour.clone());
        Ok(())
    }
}

/// Records toggles; `redrawing` is what `is_redrawing` reports.
#[derive(Default)]
pub struct RecordingMods {
    pub toggles: Mutex<Vec<(String, bool)>>,
    pub redrawing: AtomicBool,
}

#[async_trait]
impl ModToggleService for RecordingMods {
    async fn set_mod_state(
        &self,
        association: &ModAssociation,
        enabled: bool,
        _redraw: bool,
    ) -> CollaboratorResult<()> {
        self.toggles
            .lock()
            .unwrap()
            .push((association.key().to_string(), enabled));
        Ok(())
    }

    fn is_redrawing(&self) -> bool {
        self.redrawing.load(Ordering::SeqCst)
    }
}

/// Holds a status list; applying adds to it.
#[derive(Default)]
pub struct RecordingStatuses {
    pub active: Mutex<BTreeSet<Uuid>>,
    pub apply_calls: AtomicUsize,
    pub last_applied: Mutex<BTreeSet<Uuid>>,
}

#[async_trait]
impl StatusEffectService for RecordingStatuses {
    async fn active_status_ids(&self) -> CollaboratorResult<BTreeSet<Uuid>> {
        Ok(self.active.lock().unwrap().clone())
    }

    async fn apply_statuses(&self, ids: &BTreeSet<Uuid>) -> CollaboratorResult<()> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_applied.lock().unwrap() = ids.clone();
        self.active.lock().unwrap().extend(ids.iter().copied());
        Ok(())
    }
}

pub struct Fakes {
    pub equipment: Arc<RecordingEquipment>,
    pub mods: Arc<RecordingMods>,
    pub statuses: Arc<RecordingStatuses>,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            equipment: Arc::new(RecordingEquipment::default()),
            mods: Arc::new(RecordingMods::default()),
            statuses: Arc::new(RecordingStatuses::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            self.equipment.clone(),
            self.mods.clone(),
            self.statuses.clone(),
        )
    }
}

/// Two ensembles that each toggle a redraw-requesting mod, a blindfold
/// restriction and one cursed item.
pub struct Wardrobe {
    pub harness: RestraintEnsemble,
    pub straitjacket: RestraintEnsemble,
    pub blindfold: RestrictionItem,
    pub cuffs: RestrictionItem,
    pub cursed: CursedItem,
    pub status: Uuid,
}

impl Wardrobe {
    pub fn new() -> Self {
        let status = Uuid::new_v4();

        let mut harness = RestraintEnsemble::new("Harness").with_slot(
            EquipSlot::Body,
            SlotEntry::basic(GlamourItem::new(EquipSlot::Body, ItemId(1001))),
        );
        harness.mods.push(redraw_mod("harness-textures", "tight"));
        harness.moodles.push(Moodle::Status(status));

        let mut straitjacket = RestraintEnsemble::new("Straitjacket").with_slot(
            EquipSlot::Body,
            SlotEntry::basic(GlamourItem::new(EquipSlot::Body, ItemId(2002))),
        );
        straitjacket.mods.push(redraw_mod("jacket-physics", "bound"));

        let blindfold = RestrictionItem::new(
            "Leather blindfold",
            GlamourItem::new(EquipSlot::Head, ItemId(3003)),
        );
        let cuffs = RestrictionItem::new(
            "Cursed cuffs",
            GlamourItem::new(EquipSlot::Hands, ItemId(4004)),
        );
        let cursed = CursedItem::new("Mimic cuffs", CursedKind::Restriction(cuffs.id));

        Self {
            harness,
            straitjacket,
            blindfold,
            cuffs,
            cursed,
            status,
        }
    }

    pub fn catalog(&self) -> CatalogSnapshot {
        CatalogSnapshot::from_items(
            [self.blindfold.clone(), self.cuffs.clone()],
            [
                GagItem::new(GagType::BallGag)
                    .with_glamour(GlamourItem::new(EquipSlot::Head, ItemId(5005))),
                GagItem::new(GagType::ClothGag),
            ],
        )
    }

    pub fn repository(&self) -> InMemoryWardrobeRepo {
        InMemoryWardrobeRepo::with_definitions(
            vec![self.harness.clone(), self.straitjacket.clone()],
            self.catalog(),
            vec![self.cursed.clone()],
        )
    }
}

fn redraw_mod(container: &str, preset: &str) -> ModAssociation {
    let mut association = ModAssociation::new(ModPresetRef::new(container, preset));
    association.redraw = true;
    association
}

/// Redraw polling fast enough for tests, with a generous timeout.
pub fn quick_redraw() -> PipelineConfig {
    PipelineConfig {
        redraw: RedrawWaitConfig {
            initial_delay: Duration::from_millis(2),
            max_delay: Duration::from_millis(10),
            multiplier: 2.0,
            timeout: Duration::from_secs(30),
        },
        ..PipelineConfig::default()
    }
}

/// Loads `repo` through a store and builds a pipeline on top of it.
pub fn pipeline(
    repo: Arc<InMemoryWardrobeRepo>,
    fakes: &Fakes,
    clock: Arc<dyn Clock>,
    config: PipelineConfig,
) -> ApplyPipeline {
    let store = WardrobeStore::new(repo);
    let (state, catalog): (WardrobeState, CatalogSnapshot) =
        store.load().expect("repository should load");
    ApplyPipeline::new(
        state,
        PipelineDeps {
            store,
            catalog: catalog.into(),
            collaborators: fakes.collaborators(),
            permissions: Arc::new(OwnerOnly),
            events: EventBus::new(),
            clock,
        },
        config,
    )
}
