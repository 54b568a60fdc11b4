//! Async shell around `wardrobe-core`.
//!
//! The runtime persists the wardrobe, serializes every state change through
//! a single-flight [`ApplyPipeline`], publishes the resulting
//! [`wardrobe_core::ApplicationPlan`] and domain events, and drives the
//! external collaborators that actually change the character.
pub mod api;
pub mod events;
pub mod oracle;
pub mod pipeline;
pub mod repository;

mod runtime;
mod workers;

pub use api::{
    ApplyError, CollaboratorError, CollaboratorResult, Collaborators, EquipmentApplicator,
    GrantTarget, ModToggleService, OwnerOnly, PermissionProvider, Result, RuntimeError,
    StatusEffectService,
};
pub use events::{
    CursedEvent, EnsembleEvent, Event, EventBus, GagEvent, LockEvent, LockTarget, PlanEvent, Topic,
};
pub use oracle::CatalogManager;
pub use pipeline::{
    ApplyPipeline, ApplyReport, Clock, CursedLootConfig, LockParams, ManualClock, PipelineConfig,
    PipelineDeps, RedrawWait, RedrawWaitConfig, SystemClock,
};
pub use repository::{
    ActiveSnapshot, ActiveStateRepository, CatalogRepository, CursedPoolRepository,
    EnsembleRepository, FileWardrobeRepository, InMemoryWardrobeRepo, RepositoryError,
    StateCommitRepository, WardrobeRepository, WardrobeStore,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use workers::ExpiryWorker;
