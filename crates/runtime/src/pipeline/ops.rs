//! State transitions behind every pipeline operation.
//!
//! Each function validates against the current state, mutates it and
//! returns the events describing the change. A rejected operation returns
//! before touching anything; the pipeline additionally works on a copy and
//! only commits it once persisted.

use uuid::Uuid;

use wardrobe_core::{
    ActiveEnsemble, ActiveLock, CatalogSnapshot, CursedKind, GagSlot, GagType, LayerSelection,
    LockGrants, LockRequest, Lockable, Padlock, Permissions, Timestamp, UnlockRequest, UserUid,
    WardrobeConfig, WardrobeState,
};

use crate::api::{ApplyError, GrantTarget, PermissionProvider};
use crate::events::{CursedEvent, EnsembleEvent, Event, GagEvent, LockEvent, LockTarget};

pub(crate) type Outcome = std::result::Result<Vec<Event>, ApplyError>;

/// Where an operation's grants come from.
#[derive(Clone, Copy)]
pub(crate) enum Authority<'a> {
    /// Timer expiry and cursed loot. Only the pipeline constructs this.
    System,
    Provider(&'a dyn PermissionProvider),
}

/// Who is acting, with what rights, at what time.
pub(crate) struct OpContext<'a> {
    pub now: Timestamp,
    pub enactor: &'a UserUid,
    pub authority: Authority<'a>,
    pub catalog: &'a CatalogSnapshot,
}

impl OpContext<'_> {
    fn permissions(&self, target: GrantTarget) -> Permissions {
        match self.authority {
            Authority::System => Permissions::new(
                LockGrants::all(),
                WardrobeConfig::new().default_max_lock_time,
            ),
            Authority::Provider(provider) => provider.permissions(self.enactor, target),
        }
    }

    fn require(
        &self,
        grant: LockGrants,
        target: GrantTarget,
    ) -> std::result::Result<(), ApplyError> {
        if self.permissions(target).allows(grant) {
            Ok(())
        } else {
            tracing::debug!(enactor = %self.enactor.as_str(), ?grant, ?target, "missing grant");
            Err(ApplyError::PermissionDenied)
        }
    }
}

/// Padlock parameters of a lock operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockParams {
    pub padlock: Padlock,
    pub password: Option<String>,
    pub timer: Option<String>,
}

impl LockParams {
    pub fn new(padlock: Padlock) -> Self {
        Self {
            padlock,
            password: None,
            timer: None,
        }
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_timer(mut self, timer: impl Into<String>) -> Self {
        self.timer = Some(timer.into());
        self
    }

    fn request<'a>(&'a self, ctx: &OpContext<'a>, target: GrantTarget) -> LockRequest<'a> {
        let mut request = LockRequest::new(self.padlock, ctx.enactor, ctx.permissions(target));
        if let Some(password) = &self.password {
            request = request.password(password);
        }
        if let Some(timer) = &self.timer {
            request = request.timer(timer);
        }
        request
    }
}

fn unlock_request<'a>(
    ctx: &OpContext<'a>,
    target: GrantTarget,
    password: Option<&'a str>,
) -> UnlockRequest<'a> {
    let request = UnlockRequest::new(ctx.enactor, ctx.permissions(target));
    match password {
        Some(password) => request.password(password),
        None => request,
    }
}

// ===== ensembles =====

pub(crate) fn enable_ensemble(
    state: &mut WardrobeState,
    ctx: &OpContext<'_>,
    id: Uuid,
    layers: LayerSelection,
) -> Outcome {
    ctx.require(LockGrants::APPLY, GrantTarget::Ensemble(id))?;
    let layer_count = state
        .ensemble(id)
        .ok_or(ApplyError::EnsembleNotFound(id))?
        .layers
        .len();
    if state.is_enabled(id) {
        return Err(ApplyError::AlreadyActive(id));
    }

    let mut events = Vec::new();
    if state.active.is_some() {
        events.extend(disable_ensemble(state, ctx)?);
    }

    state.active =
        Some(ActiveEnsemble::new(id, ctx.enactor.clone()).with_layers(layers.clamp(layer_count)));
    tracing::info!(ensemble = %id, enactor = %ctx.enactor.as_str(), "ensemble enabled");
    events.push(
        EnsembleEvent::Enabled {
            id,
            enactor: ctx.enactor.clone(),
        }
        .into(),
    );
    Ok(events)
}

pub(crate) fn disable_ensemble(state: &mut WardrobeState, ctx: &OpContext<'_>) -> Outcome {
    let active = state.active.as_ref().ok_or(ApplyError::NoActiveEnsemble)?;
    ctx.require(LockGrants::REMOVE, GrantTarget::Ensemble(active.id))?;
    if active.padlock.is_locked() {
        return Err(ApplyError::EnsembleLocked);
    }
    let id = active.id;
    state.active = None;

    tracing::info!(ensemble = %id, enactor = %ctx.enactor.as_str(), "ensemble disabled");
    Ok(vec![
        EnsembleEvent::Disabled {
            id,
            enactor: ctx.enactor.clone(),
        }
        .into(),
    ])
}

/// Disables the active ensemble, if any, then enables `id`.
pub(crate) fn swap_ensemble(
    state: &mut WardrobeState,
    ctx: &OpContext<'_>,
    id: Uuid,
    layers: LayerSelection,
) -> Outcome {
    let mut events = Vec::new();
    if state.active.is_some() {
        events.extend(disable_ensemble(state, ctx)?);
    }
    events.extend(enable_ensemble(state, ctx, id, layers)?);
    Ok(events)
}

pub(crate) fn set_active_layers(
    state: &mut WardrobeState,
    ctx: &OpContext<'_>,
    layers: LayerSelection,
) -> Outcome {
    let id = state
        .active
        .as_ref()
        .ok_or(ApplyError::NoActiveEnsemble)?
        .id;
    ctx.require(LockGrants::APPLY, GrantTarget::Ensemble(id))?;
    let layer_count = state.ensemble(id).map_or(0, |ensemble| ensemble.layers.len());
    let active = state.active.as_mut().ok_or(ApplyError::NoActiveEnsemble)?;
    if active.padlock.is_locked() {
        return Err(ApplyError::EnsembleLocked);
    }

    active.layers = layers.clamp(layer_count);
    Ok(vec![
        EnsembleEvent::LayersChanged {
            id,
            layers: active.layers.0,
        }
        .into(),
    ])
}

pub(crate) fn lock_ensemble(
    state: &mut WardrobeState,
    ctx: &OpContext<'_>,
    params: &LockParams,
) -> Outcome {
    let active = state.active.as_mut().ok_or(ApplyError::NoActiveEnsemble)?;
    let target = GrantTarget::Ensemble(active.id);
    active.lock(&params.request(ctx, target), ctx.now)?;

    tracing::info!(ensemble = %active.id, padlock = %params.padlock, "ensemble locked");
    Ok(vec![
        LockEvent::Locked {
            target: LockTarget::Ensemble(active.id),
            padlock: params.padlock,
            enactor: ctx.enactor.clone(),
        }
        .into(),
    ])
}

pub(crate) fn unlock_ensemble(
    state: &mut WardrobeState,
    ctx: &OpContext<'_>,
    password: Option<&str>,
) -> Outcome {
    let active = state.active.as_mut().ok_or(ApplyError::NoActiveEnsemble)?;
    let target = GrantTarget::Ensemble(active.id);
    let removed = active.unlock(&unlock_request(ctx, target, password), ctx.now)?;

    tracing::info!(ensemble = %active.id, padlock = %removed.padlock, "ensemble unlocked");
    Ok(vec![
        LockEvent::Unlocked {
            target: LockTarget::Ensemble(active.id),
            padlock: removed.padlock,
            enactor: ctx.enactor.clone(),
        }
        .into(),
    ])
}

// ===== gags =====

fn gag_slot(
    state: &mut WardrobeState,
    layer: usize,
) -> std::result::Result<&mut GagSlot, ApplyError> {
    state
        .gag_slot_mut(layer)
        .ok_or(ApplyError::InvalidGagSlot(layer))
}

/// Rejects a gag type that is already worn, cursed gags included.
fn ensure_not_worn(state: &WardrobeState, gag: GagType) -> std::result::Result<(), ApplyError> {
    if state.gags.iter().any(|slot| slot.gag == Some(gag)) {
        return Err(ApplyError::GagAlreadyWorn(gag));
    }
    Ok(())
}

/// Rejects user changes to a slot a cursed gag holds.
fn ensure_not_cursed(state: &WardrobeState, layer: usize) -> std::result::Result<(), ApplyError> {
    match state.gag_slot(layer).and_then(|slot| slot.gag) {
        Some(gag) if state.is_cursed_gag(gag) => Err(ApplyError::CursedGagSlot(layer)),
        _ => Ok(()),
    }
}

/// Puts `gag` in `layer`, or in the innermost free slot when `layer` is
/// `None`.
pub(crate) fn apply_gag(
    state: &mut WardrobeState,
    ctx: &OpContext<'_>,
    layer: Option<usize>,
    gag: GagType,
) -> Outcome {
    let layer = match layer {
        Some(layer) => layer,
        None => state.first_free_gag_slot().ok_or(ApplyError::NoFreeGagSlot)?,
    };
    ctx.require(LockGrants::APPLY, GrantTarget::Gag(layer))?;
    ensure_not_worn(state, gag)?;
    let slot = gag_slot(state, layer)?;
    if !slot.is_empty() {
        return Err(ApplyError::GagSlotOccupied(layer));
    }

    *slot = GagSlot::with_gag(gag, ctx.enactor.clone());
    tracing::info!(layer, %gag, enactor = %ctx.enactor.as_str(), "gag applied");
    Ok(vec![
        GagEvent::Applied {
            slot: layer,
            gag,
            enactor: ctx.enactor.clone(),
        }
        .into(),
    ])
}

pub(crate) fn remove_gag(state: &mut WardrobeState, ctx: &OpContext<'_>, layer: usize) -> Outcome {
    ctx.require(LockGrants::REMOVE, GrantTarget::Gag(layer))?;
    ensure_not_cursed(state, layer)?;
    let slot = gag_slot(state, layer)?;
    let gag = slot.gag.ok_or(ApplyError::GagSlotEmpty(layer))?;
    if slot.is_locked() {
        return Err(ApplyError::GagLocked(layer));
    }

    *slot = GagSlot::default();
    tracing::info!(layer, %gag, enactor = %ctx.enactor.as_str(), "gag removed");
    Ok(vec![
        GagEvent::Removed {
            slot: layer,
            gag,
            enactor: ctx.enactor.clone(),
        }
        .into(),
    ])
}

/// Replaces the gag in an occupied, unlocked slot.
pub(crate) fn swap_gag(
    state: &mut WardrobeState,
    ctx: &OpContext<'_>,
    layer: usize,
    gag: GagType,
) -> Outcome {
    let mut events = remove_gag(state, ctx, layer)?;
    events.extend(apply_gag(state, ctx, Some(layer), gag)?);
    Ok(events)
}

pub(crate) fn lock_gag(
    state: &mut WardrobeState,
    ctx: &OpContext<'_>,
    layer: usize,
    params: &LockParams,
) -> Outcome {
    let slot = gag_slot(state, layer)?;
    slot.lock(&params.request(ctx, GrantTarget::Gag(layer)), ctx.now)?;

    tracing::info!(layer, padlock = %params.padlock, "gag locked");
    Ok(vec![
        LockEvent::Locked {
            target: LockTarget::Gag(layer),
            padlock: params.padlock,
            enactor: ctx.enactor.clone(),
        }
        .into(),
    ])
}

pub(crate) fn unlock_gag(
    state: &mut WardrobeState,
    ctx: &OpContext<'_>,
    layer: usize,
    password: Option<&str>,
) -> Outcome {
    ensure_not_cursed(state, layer)?;
    let slot = gag_slot(state, layer)?;
    let target = GrantTarget::Gag(layer);
    let removed = slot.unlock(&unlock_request(ctx, target, password), ctx.now)?;

    tracing::info!(layer, padlock = %removed.padlock, "gag unlocked");
    Ok(vec![
        LockEvent::Unlocked {
            target: LockTarget::Gag(layer),
            padlock: removed.padlock,
            enactor: ctx.enactor.clone(),
        }
        .into(),
    ])
}

// ===== blindfold =====

pub(crate) fn apply_blindfold(
    state: &mut WardrobeState,
    ctx: &OpContext<'_>,
    restriction: Option<Uuid>,
) -> Outcome {
    ctx.require(LockGrants::APPLY, GrantTarget::Blindfold)?;
    if let Some(id) = restriction
        && !ctx.catalog.contains_restriction(id)
    {
        return Err(ApplyError::RestrictionNotFound(id));
    }

    state.blindfold.active = true;
    state.blindfold.restriction = restriction;
    state.blindfold.enabler = Some(ctx.enactor.clone());
    tracing::info!(enactor = %ctx.enactor.as_str(), "blindfold applied");
    Ok(Vec::new())
}

pub(crate) fn remove_blindfold(state: &mut WardrobeState, ctx: &OpContext<'_>) -> Outcome {
    ctx.require(LockGrants::REMOVE, GrantTarget::Blindfold)?;
    if state.blindfold.active {
        tracing::info!(enactor = %ctx.enactor.as_str(), "blindfold removed");
    }
    state.blindfold = Default::default();
    Ok(Vec::new())
}

// ===== cursed loot =====

/// Activates a pool item until `release`. A gag-kind item takes the
/// innermost free gag slot under a system-only Mimic padlock.
pub(crate) fn apply_cursed_item(
    state: &mut WardrobeState,
    ctx: &OpContext<'_>,
    id: Uuid,
    release: Timestamp,
) -> Outcome {
    ctx.require(LockGrants::APPLY, GrantTarget::Cursed(id))?;
    let item = state
        .cursed_item(id)
        .ok_or(ApplyError::CursedItemNotFound(id))?;
    if item.is_active() {
        return Err(ApplyError::CursedItemActive(id));
    }
    let gag_target = match item.kind {
        CursedKind::Restriction(restriction) => {
            if !ctx.catalog.contains_restriction(restriction) {
                return Err(ApplyError::RestrictionNotFound(restriction));
            }
            None
        }
        CursedKind::Gag(gag) => {
            ensure_not_worn(state, gag)?;
            let layer = state.first_free_gag_slot().ok_or(ApplyError::NoFreeGagSlot)?;
            Some((layer, gag))
        }
    };

    let item = state
        .cursed_item_mut(id)
        .ok_or(ApplyError::CursedItemNotFound(id))?;
    if !item.activate(ctx.now, release) {
        return Err(ApplyError::InvalidWindow);
    }
    if let Some((layer, gag)) = gag_target {
        let slot = gag_slot(state, layer)?;
        *slot = GagSlot::with_gag(gag, ctx.enactor.clone());
        slot.force_lock(ActiveLock::new(Padlock::Mimic, UserUid::system()).with_release(release));
        tracing::info!(layer, %gag, cursed = %id, "cursed gag placed");
    }
    tracing::info!(cursed = %id, %release, "cursed item applied");
    Ok(vec![
        CursedEvent::Applied {
            id,
            applied: ctx.now,
            release,
        }
        .into(),
    ])
}

pub(crate) fn remove_cursed_item(
    state: &mut WardrobeState,
    ctx: &OpContext<'_>,
    id: Uuid,
) -> Outcome {
    ctx.require(LockGrants::REMOVE, GrantTarget::Cursed(id))?;
    let item = state
        .cursed_item_mut(id)
        .ok_or(ApplyError::CursedItemNotFound(id))?;
    if !item.is_active() {
        return Err(ApplyError::CursedItemInactive(id));
    }

    item.deactivate();
    let kind = item.kind;
    release_cursed_gag(state, kind);
    tracing::info!(cursed = %id, "cursed item removed");
    Ok(vec![CursedEvent::Removed { id }.into()])
}

// ===== system paths =====

/// Empties the gag slot a cursed gag held, Mimic padlock included.
fn release_cursed_gag(state: &mut WardrobeState, kind: CursedKind) {
    let CursedKind::Gag(gag) = kind else { return };
    let Some(layer) = state.gags.iter().position(|slot| slot.gag == Some(gag)) else {
        tracing::warn!(%gag, "cursed gag was not in any slot");
        return;
    };
    let slot = &mut state.gags[layer];
    if let Some(lock) = slot.force_unlock()
        && lock.padlock != Padlock::Mimic
    {
        tracing::warn!(layer, padlock = %lock.padlock, "cursed gag slot carried a user padlock");
    }
    *slot = GagSlot::default();
    tracing::info!(layer, %gag, "cursed gag released");
}

/// Removes elapsed timer padlocks and cursed items whose release passed.
pub(crate) fn expire_due(state: &mut WardrobeState, now: Timestamp) -> Vec<Event> {
    let mut events = Vec::new();

    if let Some(active) = state.active.as_mut()
        && active.padlock.is_expired(now)
        && let Some(lock) = active.force_unlock()
    {
        tracing::info!(ensemble = %active.id, padlock = %lock.padlock, "ensemble padlock expired");
        events.push(expired(LockTarget::Ensemble(active.id), &lock));
    }

    // Cursed items first, so a due cursed gag leaves its slot together
    // with its Mimic padlock.
    let mut released = Vec::new();
    for item in state.cursed.iter_mut().filter(|item| item.is_due(now)) {
        item.deactivate();
        tracing::info!(cursed = %item.id, "cursed item released");
        events.push(CursedEvent::Removed { id: item.id }.into());
        released.push(item.kind);
    }
    for kind in released {
        release_cursed_gag(state, kind);
    }

    for (layer, slot) in state.gags.iter_mut().enumerate() {
        if slot.padlock.is_expired(now)
            && let Some(lock) = slot.force_unlock()
        {
            tracing::info!(layer, padlock = %lock.padlock, "gag padlock expired");
            events.push(expired(LockTarget::Gag(layer), &lock));
        }
    }

    events
}

fn expired(target: LockTarget, lock: &ActiveLock) -> Event {
    LockEvent::Expired {
        target,
        padlock: lock.padlock,
    }
    .into()
}

/// Forced reset of everything the wardrobe has applied. Never fails.
pub(crate) fn safeword(state: &mut WardrobeState, enactor: &UserUid) -> Vec<Event> {
    let mut events = Vec::new();

    if let Some(mut active) = state.active.take() {
        if let Some(lock) = active.force_unlock() {
            events.push(unlocked(LockTarget::Ensemble(active.id), &lock, enactor));
        }
        events.push(
            EnsembleEvent::Disabled {
                id: active.id,
                enactor: enactor.clone(),
            }
            .into(),
        );
    }

    for (layer, slot) in state.gags.iter_mut().enumerate() {
        if let Some(lock) = slot.force_unlock() {
            events.push(unlocked(LockTarget::Gag(layer), &lock, enactor));
        }
        if let Some(gag) = slot.gag {
            events.push(
                GagEvent::Removed {
                    slot: layer,
                    gag,
                    enactor: enactor.clone(),
                }
                .into(),
            );
        }
        *slot = GagSlot::default();
    }

    state.blindfold = Default::default();

    for item in state.cursed.iter_mut().filter(|item| item.is_active()) {
        item.deactivate();
        events.push(CursedEvent::Removed { id: item.id }.into());
    }

    debug_assert_eq!(state.locked_count(), 0);
    tracing::warn!(enactor = %enactor.as_str(), "safeword used, wardrobe reset");
    events
}

fn unlocked(target: LockTarget, lock: &ActiveLock, enactor: &UserUid) -> Event {
    LockEvent::Unlocked {
        target,
        padlock: lock.padlock,
        enactor: enactor.clone(),
    }
    .into()
}
