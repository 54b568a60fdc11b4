//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration, workers, or infrastructure.

pub mod collaborators;
pub mod errors;

pub use collaborators::{
    CollaboratorError, CollaboratorResult, Collaborators, EquipmentApplicator, GrantTarget,
    ModToggleService, OwnerOnly, PermissionProvider, StatusEffectService,
};
pub use errors::{ApplyError, Result, RuntimeError};
