//! Narrow interfaces to the systems that actually change the character.
//!
//! The pipeline hands each collaborator its slice of the published plan.
//! Collaborator failures are logged by the pipeline and never fail the
//! operation that triggered them.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use wardrobe_core::{EquipSlot, GlamourItem, MetaFlags, ModAssociation, Permissions, UserUid};

#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("collaborator rejected the request: {0}")]
    Rejected(String),
}

pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;

/// Puts equipment on the rendered character.
#[async_trait]
pub trait EquipmentApplicator: Send + Sync {
    /// Applies the full slot map. Individual slot failures are the
    /// applicator's to log; an `Err` means nothing could be applied.
    async fn apply(
        &self,
        glamour: &BTreeMap<EquipSlot, GlamourItem>,
        meta: &MetaFlags,
    ) -> CollaboratorResult<()>;
}

/// Toggles companion-mod presets.
#[async_trait]
pub trait ModToggleService: Send + Sync {
    async fn set_mod_state(
        &self,
        association: &ModAssociation,
        enabled: bool,
        redraw: bool,
    ) -> CollaboratorResult<()>;

    /// True while a redraw triggered by a previous toggle is still running.
    fn is_redrawing(&self) -> bool;
}

/// Reads and writes the character's status-effect list.
#[async_trait]
pub trait StatusEffectService: Send + Sync {
    async fn active_status_ids(&self) -> CollaboratorResult<BTreeSet<Uuid>>;

    async fn apply_statuses(&self, ids: &BTreeSet<Uuid>) -> CollaboratorResult<()>;
}

/// The entity an operation acts on, as seen by a [`PermissionProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantTarget {
    Ensemble(Uuid),
    Gag(usize),
    Blindfold,
    Cursed(Uuid),
}

/// What an enactor may do to one of the wardrobe owner's items.
pub trait PermissionProvider: Send + Sync {
    fn permissions(&self, enactor: &UserUid, target: GrantTarget) -> Permissions;
}

/// Grants every enactor the owner's permissions.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOnly;

impl PermissionProvider for OwnerOnly {
    fn permissions(&self, _enactor: &UserUid, _target: GrantTarget) -> Permissions {
        Permissions::owner()
    }
}

/// The external systems one pipeline drives.
#[derive(Clone)]
pub struct Collaborators {
    pub equipment: Arc<dyn EquipmentApplicator>,
    pub mods: Arc<dyn ModToggleService>,
    pub statuses: Arc<dyn StatusEffectService>,
}

impl Collaborators {
    pub fn new(
        equipment: Arc<dyn EquipmentApplicator>,
        mods: Arc<dyn ModToggleService>,
        statuses: Arc<dyn StatusEffectService>,
    ) -> Self {
        Self {
            equipment,
            mods,
            statuses,
        }
    }

    /// Collaborators that only log.
    pub fn logging() -> Self {
        Self::new(
            Arc::new(logging::LoggingEquipment),
            Arc::new(logging::LoggingMods),
            Arc::new(logging::LoggingStatuses::default()),
        )
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Collaborators that only log what they would have done.
pub mod logging {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    pub struct LoggingEquipment;

    #[async_trait]
    impl EquipmentApplicator for LoggingEquipment {
        async fn apply(
            &self,
            glamour: &BTreeMap<EquipSlot, GlamourItem>,
            meta: &MetaFlags,
        ) -> CollaboratorResult<()> {
            for (slot, item) in glamour {
                tracing::info!(%slot, item = item.item.0, "equip");
            }
            tracing::debug!(?meta, "meta flags");
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    pub struct LoggingMods;

    #[async_trait]
    impl ModToggleService for LoggingMods {
        async fn set_mod_state(
            &self,
            association: &ModAssociation,
            enabled: bool,
            redraw: bool,
        ) -> CollaboratorResult<()> {
            tracing::info!(
                container = %association.preset.container,
                preset = %association.preset.preset,
                enabled,
                redraw,
                "mod toggled"
            );
            Ok(())
        }

        fn is_redrawing(&self) -> bool {
            false
        }
    }

    /// Keeps the applied status set in memory.
    #[derive(Debug, Default)]
    pub struct LoggingStatuses {
        active: Mutex<BTreeSet<Uuid>>,
    }

    #[async_trait]
    impl StatusEffectService for LoggingStatuses {
        async fn active_status_ids(&self) -> CollaboratorResult<BTreeSet<Uuid>> {
            self.active
                .lock()
                .map(|active| active.clone())
                .map_err(|_| CollaboratorError::Unavailable("status list poisoned".into()))
        }

        async fn apply_statuses(&self, ids: &BTreeSet<Uuid>) -> CollaboratorResult<()> {
            tracing::info!(count = ids.len(), "statuses applied");
            let mut active = self
                .active
                .lock()
                .map_err(|_| CollaboratorError::Unavailable("status list poisoned".into()))?;
            active.extend(ids.iter().copied());
            Ok(())
        }
    }
}
