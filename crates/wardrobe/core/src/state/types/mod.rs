//! Domain types shared by the resolvers, the padlock state machine and the
//! runtime.

mod associations;
mod attributes;
mod common;
mod cursed;
mod ensemble;
mod equip;
mod gag;
mod padlock;
mod restriction;

pub use associations::{CustomizeProfile, ModAssociation, ModPresetRef, Moodle};
pub use attributes::{Arousal, MetaFlags, OptionalBool, RestrictionFlags, Traits};
pub use common::{Timestamp, UserUid};
pub use cursed::{CursedItem, CursedKind, Precedence};
pub use ensemble::{
    ActiveEnsemble, AdvancedSlot, BasicSlot, Layer, LayerSelection, ModPresetLayer,
    RestraintEnsemble, RestrictionLayer, SlotEntry,
};
pub use equip::{EquipSlot, GlamourItem, ItemId, StainIds};
pub use gag::{GagItem, GagSlot, GagType};
pub use padlock::{ActiveLock, Padlock, PadlockState, PasswordRule};
pub use restriction::{BlindfoldOverlay, HypnoticOverlay, RestrictionItem, RestrictionKind};
