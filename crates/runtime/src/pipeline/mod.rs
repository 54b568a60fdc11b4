//! Single-flight apply pipeline.
//!
//! Every state-changing operation goes through [`ApplyPipeline`]: it
//! supersedes any pending redraw wait, takes the gate, validates and
//! mutates a copy of the state, persists it, commits it, recalculates the
//! [`ApplicationPlan`], publishes it and the operation's events, hands the
//! plan to the collaborators and finally waits for the redraw to settle.
//! Readers get the last published plan and state without touching the gate.
mod clock;
mod loot;
mod ops;
mod redraw;

pub use clock::{Clock, ManualClock, SystemClock};
pub use loot::CursedLootConfig;
pub use ops::LockParams;
pub use redraw::{MIN_POLL_DELAY, RedrawWait, RedrawWaitConfig, next_delay, wait_for_redraw};

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use rand::Rng;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use wardrobe_core::{
    ApplicationPlan, GagType, LayerSelection, RestraintEnsemble, Timestamp, UserUid,
    WardrobeError, WardrobeState, recalculate,
};

use crate::api::{ApplyError, Collaborators, PermissionProvider};
use crate::events::{Event, EventBus, PlanEvent};
use crate::oracle::CatalogManager;
use crate::repository::WardrobeStore;
use ops::{Authority, OpContext};

/// Tunables of the pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub redraw: RedrawWaitConfig,
    pub loot: CursedLootConfig,
}

/// Everything the pipeline talks to.
pub struct PipelineDeps {
    pub store: WardrobeStore,
    pub catalog: CatalogManager,
    pub collaborators: Collaborators,
    pub permissions: Arc<dyn PermissionProvider>,
    pub events: EventBus,
    pub clock: Arc<dyn Clock>,
}

/// Outcome of a successful operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
    /// Revision of the plan published by this operation, or the current
    /// revision when nothing changed.
    pub revision: u64,
    /// False when the operation left the state untouched.
    pub changed: bool,
    pub redraw: RedrawWait,
}

/// Cloneable handle to the wardrobe's single-flight executor.
#[derive(Clone)]
pub struct ApplyPipeline {
    shared: Arc<Shared>,
}

struct Shared {
    gate: Mutex<WardrobeState>,
    in_flight: AtomicBool,
    redraw_cancel: StdMutex<CancellationToken>,
    revision: AtomicU64,
    plan_tx: watch::Sender<Arc<ApplicationPlan>>,
    state_tx: watch::Sender<Arc<WardrobeState>>,
    store: WardrobeStore,
    catalog: CatalogManager,
    collaborators: Collaborators,
    permissions: Arc<dyn PermissionProvider>,
    events: EventBus,
    clock: Arc<dyn Clock>,
    config: PipelineConfig,
}

/// Marks the pipeline busy for as long as it lives.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ApplyPipeline {
    /// Publishes the plan of `state` as revision 0. Nothing is applied
    /// until the first operation or [`ApplyPipeline::reapply`].
    pub fn new(state: WardrobeState, deps: PipelineDeps, config: PipelineConfig) -> Self {
        let plan = recalculate(&state, deps.catalog.as_env());
        let (plan_tx, _) = watch::channel(Arc::new(plan));
        let (state_tx, _) = watch::channel(Arc::new(state.clone()));

        Self {
            shared: Arc::new(Shared {
                gate: Mutex::new(state),
                in_flight: AtomicBool::new(false),
                redraw_cancel: StdMutex::new(CancellationToken::new()),
                revision: AtomicU64::new(0),
                plan_tx,
                state_tx,
                store: deps.store,
                catalog: deps.catalog,
                collaborators: deps.collaborators,
                permissions: deps.permissions,
                events: deps.events,
                clock: deps.clock,
                config,
            }),
        }
    }

    // ===== read-only accessors =====

    /// Last published plan.
    pub fn plan(&self) -> Arc<ApplicationPlan> {
        self.shared.plan_tx.borrow().clone()
    }

    pub fn subscribe_plan(&self) -> watch::Receiver<Arc<ApplicationPlan>> {
        self.shared.plan_tx.subscribe()
    }

    pub fn revision(&self) -> u64 {
        self.shared.revision.load(Ordering::SeqCst)
    }

    pub fn is_in_flight(&self) -> bool {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    /// Last committed state.
    pub fn state_snapshot(&self) -> Arc<WardrobeState> {
        self.shared.state_tx.borrow().clone()
    }

    pub fn active_ensemble(&self) -> Option<RestraintEnsemble> {
        self.state_snapshot().active_ensemble().cloned()
    }

    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }

    pub fn catalog(&self) -> &CatalogManager {
        &self.shared.catalog
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.shared.clock
    }

    // ===== ensembles =====

    pub async fn enable_ensemble(
        &self,
        enactor: &UserUid,
        id: Uuid,
        layers: LayerSelection,
    ) -> Result<ApplyReport, ApplyError> {
        self.run("enable_ensemble", enactor, |state, ctx| {
            ops::enable_ensemble(state, ctx, id, layers)
        })
        .await
    }

    pub async fn disable_ensemble(&self, enactor: &UserUid) -> Result<ApplyReport, ApplyError> {
        self.run("disable_ensemble", enactor, ops::disable_ensemble)
            .await
    }

    /// Disable-then-enable as one operation.
    pub async fn swap_ensemble(
        &self,
        enactor: &UserUid,
        id: Uuid,
        layers: LayerSelection,
    ) -> Result<ApplyReport, ApplyError> {
        self.run("swap_ensemble", enactor, |state, ctx| {
            ops::swap_ensemble(state, ctx, id, layers)
        })
        .await
    }

    pub async fn set_active_layers(
        &self,
        enactor: &UserUid,
        layers: LayerSelection,
    ) -> Result<ApplyReport, ApplyError> {
        self.run("set_active_layers", enactor, |state, ctx| {
            ops::set_active_layers(state, ctx, layers)
        })
        .await
    }

    pub async fn lock_ensemble(
        &self,
        enactor: &UserUid,
        params: &LockParams,
    ) -> Result<ApplyReport, ApplyError> {
        self.run("lock_ensemble", enactor, |state, ctx| {
            ops::lock_ensemble(state, ctx, params)
        })
        .await
    }

    pub async fn unlock_ensemble(
        &self,
        enactor: &UserUid,
        password: Option<&str>,
    ) -> Result<ApplyReport, ApplyError> {
        self.run("unlock_ensemble", enactor, |state, ctx| {
            ops::unlock_ensemble(state, ctx, password)
        })
        .await
    }

    // ===== gags =====

    /// Applies `gag` to `layer`, or to the innermost free slot.
    pub async fn apply_gag(
        &self,
        enactor: &UserUid,
        layer: Option<usize>,
        gag: GagType,
    ) -> Result<ApplyReport, ApplyError> {
        self.run("apply_gag", enactor, |state, ctx| {
            ops::apply_gag(state, ctx, layer, gag)
        })
        .await
    }

    pub async fn remove_gag(
        &self,
        enactor: &UserUid,
        layer: usize,
    ) -> Result<ApplyReport, ApplyError> {
        self.run("remove_gag", enactor, |state, ctx| {
            ops::remove_gag(state, ctx, layer)
        })
        .await
    }

    pub async fn swap_gag(
        &self,
        enactor: &UserUid,
        layer: usize,
        gag: GagType,
    ) -> Result<ApplyReport, ApplyError> {
        self.run("swap_gag", enactor, |state, ctx| {
            ops::swap_gag(state, ctx, layer, gag)
        })
        .await
    }

    pub async fn lock_gag(
        &self,
        enactor: &UserUid,
        layer: usize,
        params: &LockParams,
    ) -> Result<ApplyReport, ApplyError> {
        self.run("lock_gag", enactor, |state, ctx| {
            ops::lock_gag(state, ctx, layer, params)
        })
        .await
    }

    pub async fn unlock_gag(
        &self,
        enactor: &UserUid,
        layer: usize,
        password: Option<&str>,
    ) -> Result<ApplyReport, ApplyError> {
        self.run("unlock_gag", enactor, |state, ctx| {
            ops::unlock_gag(state, ctx, layer, password)
        })
        .await
    }

    // ===== blindfold =====

    pub async fn apply_blindfold(
        &self,
        enactor: &UserUid,
        restriction: Option<Uuid>,
    ) -> Result<ApplyReport, ApplyError> {
        self.run("apply_blindfold", enactor, |state, ctx| {
            ops::apply_blindfold(state, ctx, restriction)
        })
        .await
    }

    pub async fn remove_blindfold(&self, enactor: &UserUid) -> Result<ApplyReport, ApplyError> {
        self.run("remove_blindfold", enactor, ops::remove_blindfold)
            .await
    }

    // ===== cursed loot =====

    pub async fn apply_cursed_item(
        &self,
        enactor: &UserUid,
        id: Uuid,
        release: Timestamp,
    ) -> Result<ApplyReport, ApplyError> {
        self.run("apply_cursed_item", enactor, |state, ctx| {
            ops::apply_cursed_item(state, ctx, id, release)
        })
        .await
    }

    pub async fn remove_cursed_item(
        &self,
        enactor: &UserUid,
        id: Uuid,
    ) -> Result<ApplyReport, ApplyError> {
        self.run("remove_cursed_item", enactor, |state, ctx| {
            ops::remove_cursed_item(state, ctx, id)
        })
        .await
    }

    /// Applies a random inactive pool item for a random duration.
    pub async fn roll_cursed_loot<R>(&self, rng: &mut R) -> Result<ApplyReport, ApplyError>
    where
        R: Rng + Send + ?Sized,
    {
        let config = self.shared.config.loot.clone();
        self.run_as_system("roll_cursed_loot", |state, ctx| {
            let (id, release) =
                loot::roll(state, &config, ctx.now, rng).ok_or(ApplyError::PoolExhausted)?;
            ops::apply_cursed_item(state, ctx, id, release)
        })
        .await
    }

    // ===== system paths =====

    /// Releases timer padlocks and cursed items due at `now`.
    pub async fn expire_due(&self, now: Timestamp) -> Result<ApplyReport, ApplyError> {
        self.run_as_system("expire_due", |state, _| Ok(ops::expire_due(state, now)))
            .await
    }

    /// Unlocks and removes everything. Only persistence can make this fail.
    pub async fn safeword(&self, enactor: &UserUid) -> Result<ApplyReport, ApplyError> {
        self.run("safeword", enactor, |state, _| Ok(ops::safeword(state, enactor)))
            .await
    }

    /// Hands the current plan to the collaborators again, as if nothing
    /// had been applied before.
    pub async fn reapply(&self) -> RedrawWait {
        let token = self.supersede();
        let _state = self.shared.gate.lock().await;
        let _flight = InFlight::enter(&self.shared.in_flight);
        let plan = self.plan();
        self.apply_plan(&ApplicationPlan::empty(), &plan, &token)
            .await
    }

    // ===== internals =====

    /// Cancels the previous operation's redraw wait and issues a fresh
    /// token for the caller.
    fn supersede(&self) -> CancellationToken {
        let fresh = CancellationToken::new();
        let mut current = self
            .shared
            .redraw_cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        *current = fresh.clone();
        fresh
    }

    /// Runs a caller-initiated operation with the grants the permission
    /// provider hands `enactor`. The system identity cannot be claimed here.
    async fn run<F>(
        &self,
        operation: &'static str,
        enactor: &UserUid,
        mutate: F,
    ) -> Result<ApplyReport, ApplyError>
    where
        F: FnOnce(&mut WardrobeState, &OpContext<'_>) -> ops::Outcome,
    {
        if enactor.is_system() {
            tracing::warn!(operation, "caller claimed the reserved system identity");
            return Err(ApplyError::ReservedEnactor(enactor.to_string()));
        }
        let authority = Authority::Provider(self.shared.permissions.as_ref());
        self.execute(operation, enactor, authority, mutate).await
    }

    /// Runs a timer- or loot-driven operation with every grant.
    async fn run_as_system<F>(
        &self,
        operation: &'static str,
        mutate: F,
    ) -> Result<ApplyReport, ApplyError>
    where
        F: FnOnce(&mut WardrobeState, &OpContext<'_>) -> ops::Outcome,
    {
        let system = UserUid::system();
        self.execute(operation, &system, Authority::System, mutate)
            .await
    }

    async fn execute<F>(
        &self,
        operation: &'static str,
        enactor: &UserUid,
        authority: Authority<'_>,
        mutate: F,
    ) -> Result<ApplyReport, ApplyError>
    where
        F: FnOnce(&mut WardrobeState, &OpContext<'_>) -> ops::Outcome,
    {
        let token = self.supersede();
        let mut state = self.shared.gate.lock().await;
        let _flight = InFlight::enter(&self.shared.in_flight);

        let ctx = OpContext {
            now: self.shared.clock.now(),
            enactor,
            authority,
            catalog: self.shared.catalog.snapshot(),
        };
        let mut next = state.clone();
        let events = match mutate(&mut next, &ctx) {
            Ok(events) => events,
            Err(err) => {
                tracing::debug!(
                    operation,
                    code = err.error_code(),
                    error = %err,
                    "operation rejected"
                );
                return Err(err);
            }
        };

        if next == *state {
            tracing::debug!(operation, "operation changed nothing");
            return Ok(ApplyReport {
                revision: self.revision(),
                changed: false,
                redraw: RedrawWait::Settled,
            });
        }

        self.shared.store.save_state(&next)?;
        *state = next;
        self.shared.state_tx.send_replace(Arc::new(state.clone()));

        let plan = Arc::new(recalculate(&state, self.shared.catalog.as_env()));
        let previous = self.shared.plan_tx.send_replace(plan.clone());
        let revision = self.shared.revision.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(operation, revision, enactor = %enactor.as_str(), "state committed");

        for event in events {
            self.shared.events.publish(event);
        }
        self.shared
            .events
            .publish(Event::Plan(PlanEvent { revision }));

        let redraw = self.apply_plan(&previous, &plan, &token).await;
        Ok(ApplyReport {
            revision,
            changed: true,
            redraw,
        })
    }

    /// Best-effort application; failures are logged and never undo the
    /// committed state.
    async fn apply_plan(
        &self,
        previous: &ApplicationPlan,
        plan: &ApplicationPlan,
        token: &CancellationToken,
    ) -> RedrawWait {
        let collaborators = &self.shared.collaborators;

        if let Err(err) = collaborators
            .equipment
            .apply(&plan.glamour, &plan.meta)
            .await
        {
            tracing::warn!(error = %err, "equipment application failed");
        }

        let mut toggled = false;
        for association in plan.removed_mods(previous) {
            toggled = true;
            if let Err(err) = collaborators
                .mods
                .set_mod_state(association, false, association.redraw)
                .await
            {
                tracing::warn!(mod_key = association.key(), error = %err, "mod disable failed");
            }
        }
        for association in plan.added_mods(previous) {
            toggled = true;
            if let Err(err) = collaborators
                .mods
                .set_mod_state(association, true, association.redraw)
                .await
            {
                tracing::warn!(mod_key = association.key(), error = %err, "mod enable failed");
            }
        }

        self.reconcile_statuses(plan).await;

        if !toggled {
            return RedrawWait::Settled;
        }
        let mods = collaborators.mods.clone();
        wait_for_redraw(
            || mods.is_redrawing(),
            self.shared.clock.as_ref(),
            &self.shared.config.redraw,
            token,
        )
        .await
    }

    /// Re-applies expected status ids the character is missing.
    async fn reconcile_statuses(&self, plan: &ApplicationPlan) {
        let statuses = &self.shared.collaborators.statuses;
        let active = match statuses.active_status_ids().await {
            Ok(active) => active,
            Err(err) => {
                tracing::warn!(error = %err, "could not read active statuses");
                return;
            }
        };

        let missing: BTreeSet<Uuid> = plan.statuses.difference(&active).copied().collect();
        if missing.is_empty() {
            return;
        }
        if let Err(err) = statuses.apply_statuses(&missing).await {
            tracing::warn!(missing = missing.len(), error = %err, "status reconciliation failed");
        }
    }
}

impl std::fmt::Debug for ApplyPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplyPipeline")
            .field("revision", &self.revision())
            .field("in_flight", &self.is_in_flight())
            .finish_non_exhaustive()
    }
}
