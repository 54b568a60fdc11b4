//! Worker tasks that back the runtime orchestration.
//!
//! The expiry worker releases timed padlocks and cursed items on schedule;
//! user-triggered operations go straight through the apply pipeline.

mod expiry;

pub use expiry::ExpiryWorker;
