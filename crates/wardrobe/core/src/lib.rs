//! Pure wardrobe domain logic.
//!
//! `wardrobe-core` defines the item model (ensembles, restriction items, gag
//! slots, cursed loot), the padlock state machine shared by every lockable
//! entity, and the resolvers that turn [`WardrobeState`] into a
//! conflict-free [`ApplicationPlan`]. Nothing here performs I/O or awaits;
//! the runtime crate drives these APIs from its apply pipeline.
pub mod config;
pub mod env;
pub mod error;
pub mod lock;
pub mod resolve;
pub mod state;

pub use config::WardrobeConfig;
pub use env::{CatalogSnapshot, GagOracle, RestrictionOracle, WardrobeEnv};
pub use error::{ErrorSeverity, WardrobeError};
pub use lock::{
    LockError, LockGrants, LockRequest, Lockable, Permissions, TimerError, UnlockError,
    UnlockRequest, parse_timer,
};
pub use resolve::{
    ApplicationPlan, Contributions, LayerResolver, PlanSource, PoolResolution, Recalculator,
    recalculate, resolve_pool,
};
pub use state::{
    ActiveEnsemble, ActiveLock, AdvancedSlot, Arousal, BasicSlot, BlindfoldOverlay,
    BlindfoldState, CursedItem, CursedKind, CustomizeProfile, EquipSlot, GagItem, GagSlot,
    GagType, GlamourItem, HypnoticOverlay, ItemId, Layer, LayerSelection, MetaFlags,
    ModAssociation, ModPresetLayer, ModPresetRef, Moodle, OptionalBool, Padlock, PadlockState,
    PasswordRule, Precedence, RestraintEnsemble, RestrictionFlags, RestrictionItem,
    RestrictionKind, RestrictionLayer, SlotEntry, StainIds, Timestamp, Traits, UserUid,
    WardrobeState,
};
