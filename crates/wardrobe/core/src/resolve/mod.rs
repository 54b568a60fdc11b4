//! Resolution of wardrobe state into an application plan.
//!
//! - [`LayerResolver`] flattens one ensemble's layers and base slots.
//! - [`resolve_pool`] picks the winning cursed item per equip slot.
//! - [`Recalculator`] merges ensemble, gags, blindfold and cursed pool.
mod contribution;
mod cursed;
mod layers;
mod plan;

pub use contribution::Contributions;
pub use cursed::{PoolResolution, displaces, resolve_pool, resolve_with};
pub use layers::LayerResolver;
pub use plan::{ApplicationPlan, PlanSource, Recalculator, recalculate};
