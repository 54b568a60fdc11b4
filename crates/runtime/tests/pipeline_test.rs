mod support;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::TimeDelta;
use rand::SeedableRng;
use rand::rngs::StdRng;

use wardrobe_core::{
    GagType, LayerSelection, Padlock, UnlockError, UserUid, WardrobeEnv, recalculate,
};
use wardrobe_runtime::{
    ActiveStateRepository, ApplyError, Clock, EnsembleEvent, Event, InMemoryWardrobeRepo,
    LockEvent, LockParams, LockTarget, ManualClock, PipelineConfig, RedrawWait, RepositoryError,
    SystemClock, Topic,
};

use support::{Fakes, Wardrobe, pipeline, quick_redraw, t0};

/// Back-to-back enables while a redraw is still running
///
/// 1. Enable the harness; its mod toggle starts a redraw that never settles
/// 2. While the first call waits, enable the straitjacket
/// 3. The first call's wait is cancelled; the second one settles once the
///    redraw finishes
/// 4. The persisted and published state both reflect the straitjacket
#[tokio::test]
async fn second_enable_supersedes_pending_redraw_wait() {
    let wardrobe = Wardrobe::new();
    let repo = Arc::new(wardrobe.repository());
    let fakes = Fakes::new();
    fakes.mods.redrawing.store(true, Ordering::SeqCst);
    let pipeline = pipeline(repo.clone(), &fakes, Arc::new(SystemClock), quick_redraw());
    let alice = UserUid::new("alice");

    // ================================================================
    // PHASE 1: first enable commits, then blocks on the redraw
    // ================================================================
    let mut plans = pipeline.subscribe_plan();
    let first = tokio::spawn({
        let pipeline = pipeline.clone();
        let alice = alice.clone();
        let id = wardrobe.harness.id;
        async move { pipeline.enable_ensemble(&alice, id, LayerSelection::ALL).await }
    });
    plans.changed().await.expect("plan should be published");
    assert_eq!(pipeline.revision(), 1);
    assert!(pipeline.is_in_flight(), "first call is still waiting");

    // ================================================================
    // PHASE 2: second enable cancels the first wait
    // ================================================================
    let second = tokio::spawn({
        let pipeline = pipeline.clone();
        let alice = alice.clone();
        let id = wardrobe.straitjacket.id;
        async move { pipeline.enable_ensemble(&alice, id, LayerSelection::ALL).await }
    });

    let first = first
        .await
        .expect("task should not panic")
        .expect("first enable should succeed");
    assert_eq!(first.redraw, RedrawWait::Cancelled);
    assert_eq!(first.revision, 1);

    plans.changed().await.expect("second plan should be published");
    fakes.mods.redrawing.store(false, Ordering::SeqCst);

    let second = tokio::time::timeout(Duration::from_secs(5), second)
        .await
        .expect("second enable should settle")
        .expect("task should not panic")
        .expect("second enable should succeed");
    assert_eq!(second.redraw, RedrawWait::Settled);
    assert_eq!(second.revision, 2);
    assert!(!pipeline.is_in_flight());

    // ================================================================
    // PHASE 3: durable and published state agree on the straitjacket
    // ================================================================
    assert_eq!(
        repo.enabled_ensemble().expect("repository readable"),
        Some(wardrobe.straitjacket.id)
    );
    let persisted = repo.load_active().expect("active state readable");
    assert_eq!(
        persisted.active.map(|active| active.id),
        Some(wardrobe.straitjacket.id)
    );

    let state = pipeline.state_snapshot();
    let catalog = pipeline.catalog().snapshot();
    let expected = recalculate(&state, WardrobeEnv::from_catalog(catalog));
    assert_eq!(*pipeline.plan(), expected);
    assert_eq!(pipeline.plan().mods.len(), 1);
    assert_eq!(pipeline.plan().mods[0].key(), "jacket-physics");

    // The harness mod went on, then off again when the jacket replaced it.
    let toggles = fakes.mods.toggles.lock().unwrap().clone();
    assert_eq!(
        toggles,
        vec![
            ("harness-textures".to_string(), true),
            ("harness-textures".to_string(), false),
            ("jacket-physics".to_string(), true),
        ]
    );
}

/// Timer padlock lifecycle on an ensemble, driven by a manual clock
///
/// 1. Alice enables and locks the harness with a 10s timer password lock
/// 2. At +5s Bob's wrong guess is rejected
/// 3. At +11s the timer has run out and Bob can unlock it
#[tokio::test]
async fn timer_lock_opens_once_release_passes() {
    let wardrobe = Wardrobe::new();
    let repo = Arc::new(wardrobe.repository());
    let fakes = Fakes::new();
    let clock = Arc::new(ManualClock::new(t0()));
    let pipeline = pipeline(repo, &fakes, clock.clone(), PipelineConfig::default());
    let alice = UserUid::new("alice");
    let bob = UserUid::new("bob");

    pipeline
        .enable_ensemble(&alice, wardrobe.harness.id, LayerSelection::ALL)
        .await
        .expect("enable should succeed");
    pipeline
        .lock_ensemble(
            &alice,
            &LockParams::new(Padlock::TimerPassword)
                .with_password("secret1")
                .with_timer("10s"),
        )
        .await
        .expect("lock should succeed");

    clock.advance(TimeDelta::seconds(5));
    let err = pipeline
        .unlock_ensemble(&bob, Some("guess"))
        .await
        .expect_err("wrong password before release must fail");
    assert!(matches!(
        err,
        ApplyError::Unlock(UnlockError::WrongPassword | UnlockError::NotYetExpired { .. })
    ));
    let active = pipeline.active_ensemble().expect("still enabled");
    assert_eq!(active.id, wardrobe.harness.id);
    assert!(pipeline.state_snapshot().active.as_ref().unwrap().padlock.is_locked());

    clock.advance(TimeDelta::seconds(6));
    let report = pipeline
        .unlock_ensemble(&bob, Some("guess"))
        .await
        .expect("expired timer lets anyone unlock");
    assert!(report.changed);
    assert!(!pipeline.state_snapshot().active.as_ref().unwrap().padlock.is_locked());
}

/// Due timers and cursed items are released by the system sweep.
#[tokio::test]
async fn expire_due_releases_timers_and_cursed_items() {
    let wardrobe = Wardrobe::new();
    let repo = Arc::new(wardrobe.repository());
    let fakes = Fakes::new();
    let clock = Arc::new(ManualClock::new(t0()));
    let pipeline = pipeline(repo, &fakes, clock.clone(), PipelineConfig::default());
    let alice = UserUid::new("alice");
    let mut locks = pipeline.events().subscribe(Topic::Lock);

    pipeline
        .apply_gag(&alice, Some(0), GagType::BallGag)
        .await
        .expect("gag applies");
    pipeline
        .lock_gag(&alice, 0, &LockParams::new(Padlock::Timer).with_timer("30s"))
        .await
        .expect("gag locks");
    pipeline
        .apply_cursed_item(&alice, wardrobe.cursed.id, t0() + TimeDelta::minutes(1))
        .await
        .expect("cursed item applies");

    // Nothing is due yet.
    let idle = pipeline
        .expire_due(clock.now())
        .await
        .expect("sweep never fails here");
    assert!(!idle.changed);

    clock.advance(TimeDelta::minutes(2));
    let report = pipeline
        .expire_due(clock.now())
        .await
        .expect("sweep succeeds");
    assert!(report.changed);

    let state = pipeline.state_snapshot();
    assert!(!state.gags[0].is_locked());
    assert_eq!(state.gags[0].gag, Some(GagType::BallGag), "gag stays on");
    assert!(state.active_cursed().next().is_none());

    let locked = locks.recv().await.expect("lock event");
    assert!(matches!(locked, Event::Lock(LockEvent::Locked { .. })));
    let expired = locks.recv().await.expect("expiry event");
    assert_eq!(
        expired,
        Event::Lock(LockEvent::Expired {
            target: LockTarget::Gag(0),
            padlock: Padlock::Timer,
        })
    );
}

/// Safeword clears every lock and item and is always allowed.
#[tokio::test]
async fn safeword_releases_everything() {
    let wardrobe = Wardrobe::new();
    let repo = Arc::new(wardrobe.repository());
    let fakes = Fakes::new();
    let clock = Arc::new(ManualClock::new(t0()));
    let pipeline = pipeline(repo.clone(), &fakes, clock, PipelineConfig::default());
    let alice = UserUid::new("alice");
    let owner = UserUid::new("owner");

    pipeline
        .enable_ensemble(&alice, wardrobe.harness.id, LayerSelection::ALL)
        .await
        .unwrap();
    pipeline
        .lock_ensemble(&alice, &LockParams::new(Padlock::Devotional))
        .await
        .unwrap();
    pipeline
        .apply_gag(&alice, None, GagType::ClothGag)
        .await
        .unwrap();
    pipeline
        .apply_blindfold(&alice, Some(wardrobe.blindfold.id))
        .await
        .unwrap();
    pipeline
        .apply_cursed_item(&alice, wardrobe.cursed.id, t0() + TimeDelta::hours(1))
        .await
        .unwrap();

    // Only Alice could open a devotional lock.
    let err = pipeline.unlock_ensemble(&owner, None).await.unwrap_err();
    assert!(matches!(err, ApplyError::Unlock(_)));

    let report = pipeline.safeword(&owner).await.expect("safeword succeeds");
    assert!(report.changed);

    let state = pipeline.state_snapshot();
    assert!(state.active.is_none());
    assert!(state.gags.iter().all(|slot| slot.is_empty()));
    assert!(!state.blindfold.active);
    assert!(state.active_cursed().next().is_none());
    assert_eq!(repo.enabled_ensemble().unwrap(), None);
    assert!(pipeline.plan().glamour.is_empty());
}

/// The reserved system id cannot be used to act through the public surface.
#[tokio::test]
async fn system_id_cannot_be_claimed_by_a_caller() {
    let wardrobe = Wardrobe::new();
    let repo = Arc::new(wardrobe.repository());
    let fakes = Fakes::new();
    let clock = Arc::new(ManualClock::new(t0()));
    let pipeline = pipeline(repo, &fakes, clock, PipelineConfig::default());
    let alice = UserUid::new("alice");
    let spoofed = UserUid::new("SYSTEM");
    assert!(spoofed.is_system());

    pipeline
        .enable_ensemble(&alice, wardrobe.harness.id, LayerSelection::ALL)
        .await
        .unwrap();
    pipeline
        .lock_ensemble(&alice, &LockParams::new(Padlock::Devotional))
        .await
        .unwrap();
    let revision = pipeline.revision();

    let err = pipeline.unlock_ensemble(&spoofed, None).await.unwrap_err();
    assert!(matches!(err, ApplyError::ReservedEnactor(ref id) if id == "SYSTEM"));
    let err = pipeline
        .apply_gag(&spoofed, None, GagType::BallGag)
        .await
        .unwrap_err();
    assert!(matches!(err, ApplyError::ReservedEnactor(_)));

    let state = pipeline.state_snapshot();
    assert!(state.active.as_ref().unwrap().padlock.is_locked());
    assert!(state.gags.iter().all(|slot| slot.is_empty()));
    assert_eq!(pipeline.revision(), revision);
}

/// Events for an operation are visible only after its state is committed.
#[tokio::test]
async fn events_follow_commit() {
    let wardrobe = Wardrobe::new();
    let repo = Arc::new(wardrobe.repository());
    let fakes = Fakes::new();
    let pipeline = pipeline(repo, &fakes, Arc::new(SystemClock), quick_redraw());
    let alice = UserUid::new("alice");
    let mut ensembles = pipeline.events().subscribe(Topic::Ensemble);
    let mut plans = pipeline.events().subscribe(Topic::Plan);

    let observer = tokio::spawn({
        let pipeline = pipeline.clone();
        async move {
            let event = ensembles.recv().await.expect("ensemble event");
            (event, pipeline.active_ensemble().map(|ensemble| ensemble.id))
        }
    });

    pipeline
        .enable_ensemble(&alice, wardrobe.harness.id, LayerSelection::ALL)
        .await
        .unwrap();

    let (event, seen_active) = observer.await.unwrap();
    assert_eq!(
        event,
        Event::Ensemble(EnsembleEvent::Enabled {
            id: wardrobe.harness.id,
            enactor: alice.clone(),
        })
    );
    assert_eq!(seen_active, Some(wardrobe.harness.id));

    let plan = plans.recv().await.expect("plan event");
    assert!(matches!(plan, Event::Plan(ref published) if published.revision == 1));
}

/// Rejected and no-op operations leave revision and collaborators alone.
#[tokio::test]
async fn rejected_operations_do_not_publish() {
    let wardrobe = Wardrobe::new();
    let repo = Arc::new(wardrobe.repository());
    let fakes = Fakes::new();
    let pipeline = pipeline(repo, &fakes, Arc::new(SystemClock), quick_redraw());
    let alice = UserUid::new("alice");

    let err = pipeline.disable_ensemble(&alice).await.unwrap_err();
    assert!(matches!(err, ApplyError::NoActiveEnsemble));

    let err = pipeline.remove_gag(&alice, 3).await.unwrap_err();
    assert!(matches!(err, ApplyError::InvalidGagSlot(3)));

    let report = pipeline.remove_blindfold(&alice).await.unwrap();
    assert!(!report.changed);

    assert_eq!(pipeline.revision(), 0);
    assert!(fakes.equipment.applied.lock().unwrap().is_empty());
}

/// Collaborator failures are logged, not surfaced.
#[tokio::test]
async fn collaborator_failure_does_not_fail_operation() {
    let wardrobe = Wardrobe::new();
    let repo = Arc::new(wardrobe.repository());
    let fakes = Fakes::new();
    fakes.equipment.fail.store(true, Ordering::SeqCst);
    let pipeline = pipeline(repo, &fakes, Arc::new(SystemClock), quick_redraw());
    let alice = UserUid::new("alice");

    let report = pipeline
        .enable_ensemble(&alice, wardrobe.harness.id, LayerSelection::ALL)
        .await
        .expect("equipment failure is not an operation failure");
    assert!(report.changed);
    assert_eq!(report.redraw, RedrawWait::Settled);
    assert_eq!(
        pipeline.active_ensemble().map(|ensemble| ensemble.id),
        Some(wardrobe.harness.id)
    );
}

/// Only statuses missing from the character are re-applied.
#[tokio::test]
async fn status_reconciliation_applies_missing_only() {
    let wardrobe = Wardrobe::new();
    let repo = Arc::new(wardrobe.repository());
    let fakes = Fakes::new();
    let pipeline = pipeline(repo, &fakes, Arc::new(SystemClock), quick_redraw());
    let alice = UserUid::new("alice");

    pipeline
        .enable_ensemble(&alice, wardrobe.harness.id, LayerSelection::ALL)
        .await
        .unwrap();
    assert_eq!(fakes.statuses.apply_calls.load(Ordering::SeqCst), 1);
    assert!(
        fakes
            .statuses
            .last_applied
            .lock()
            .unwrap()
            .contains(&wardrobe.status)
    );

    // The status is already present, so another change does not re-send it.
    pipeline
        .apply_gag(&alice, None, GagType::BallGag)
        .await
        .unwrap();
    assert_eq!(fakes.statuses.apply_calls.load(Ordering::SeqCst), 1);

    // Something stripped it; reapply puts it back.
    fakes.statuses.active.lock().unwrap().clear();
    let redraw = pipeline.reapply().await;
    assert_eq!(redraw, RedrawWait::Settled);
    assert_eq!(fakes.statuses.apply_calls.load(Ordering::SeqCst), 2);
}

/// Rolling loot activates the only pool item, then reports exhaustion.
#[tokio::test]
async fn cursed_loot_rolls_until_pool_is_exhausted() {
    let wardrobe = Wardrobe::new();
    let repo = Arc::new(wardrobe.repository());
    let fakes = Fakes::new();
    let clock = Arc::new(ManualClock::new(t0()));
    let pipeline = pipeline(repo, &fakes, clock, PipelineConfig::default());
    let mut rng = StdRng::seed_from_u64(7);

    let report = pipeline.roll_cursed_loot(&mut rng).await.expect("roll succeeds");
    assert!(report.changed);

    let state = pipeline.state_snapshot();
    let applied = state.cursed_item(wardrobe.cursed.id).expect("pool item");
    assert!(applied.is_active());
    let release = applied.release.expect("release set");
    assert!(release >= t0() + TimeDelta::minutes(15));
    assert!(release <= t0() + TimeDelta::hours(2));
    assert_eq!(
        pipeline.plan().glamour_at(wardrobe_core::EquipSlot::Hands),
        Some(&wardrobe.cuffs.glamour)
    );

    let err = pipeline.roll_cursed_loot(&mut rng).await.unwrap_err();
    assert!(matches!(err, ApplyError::PoolExhausted));
}

/// A failed save rejects the operation and keeps the previous state.
#[tokio::test]
async fn persistence_failure_rolls_back() {
    use wardrobe_core::{CatalogSnapshot, CursedItem, RestraintEnsemble};
    use wardrobe_runtime::{
        ActiveSnapshot, CatalogRepository, CursedPoolRepository, EnsembleRepository,
        StateCommitRepository,
    };

    /// Reads from an in-memory repo, refuses every write.
    struct ReadOnly(InMemoryWardrobeRepo);

    fn denied() -> RepositoryError {
        RepositoryError::Io(std::io::Error::other("disk full"))
    }

    impl EnsembleRepository for ReadOnly {
        fn load_ensembles(&self) -> Result<Vec<RestraintEnsemble>, RepositoryError> {
            self.0.load_ensembles()
        }
        fn save_ensembles(
            &self,
            _: &[RestraintEnsemble],
            _: Option<uuid::Uuid>,
        ) -> Result<(), RepositoryError> {
            Err(denied())
        }
    }
    impl CatalogRepository for ReadOnly {
        fn load_catalog(&self) -> Result<CatalogSnapshot, RepositoryError> {
            self.0.load_catalog()
        }
        fn save_catalog(&self, _: &CatalogSnapshot) -> Result<(), RepositoryError> {
            Err(denied())
        }
    }
    impl CursedPoolRepository for ReadOnly {
        fn load_cursed(&self) -> Result<Vec<CursedItem>, RepositoryError> {
            self.0.load_cursed()
        }
        fn save_cursed(&self, _: &[CursedItem]) -> Result<(), RepositoryError> {
            Err(denied())
        }
    }
    impl ActiveStateRepository for ReadOnly {
        fn load_active(&self) -> Result<ActiveSnapshot, RepositoryError> {
            self.0.load_active()
        }
        fn save_active(&self, _: &ActiveSnapshot) -> Result<(), RepositoryError> {
            Err(denied())
        }
    }
    impl StateCommitRepository for ReadOnly {
        fn commit_state(
            &self,
            _: &[RestraintEnsemble],
            _: &[CursedItem],
            _: &ActiveSnapshot,
        ) -> Result<(), RepositoryError> {
            Err(denied())
        }
    }

    let wardrobe = Wardrobe::new();
    let fakes = Fakes::new();
    let store = wardrobe_runtime::WardrobeStore::new(Arc::new(ReadOnly(wardrobe.repository())));
    let (state, catalog) = store.load().unwrap();
    let pipeline = wardrobe_runtime::ApplyPipeline::new(
        state,
        wardrobe_runtime::PipelineDeps {
            store,
            catalog: catalog.into(),
            collaborators: fakes.collaborators(),
            permissions: Arc::new(wardrobe_runtime::OwnerOnly),
            events: wardrobe_runtime::EventBus::new(),
            clock: Arc::new(SystemClock),
        },
        quick_redraw(),
    );

    let err = pipeline
        .enable_ensemble(&UserUid::new("alice"), wardrobe.harness.id, LayerSelection::ALL)
        .await
        .unwrap_err();
    assert!(matches!(err, ApplyError::Persistence(_)));
    assert!(pipeline.active_ensemble().is_none());
    assert_eq!(pipeline.revision(), 0);
    assert!(fakes.equipment.applied.lock().unwrap().is_empty());
}
