// src/provision/mod.rs

//! Post-activation application lifecycle commands.
//!
//! The commands themselves are opaque; this module owns their order, the
//! two idempotency gates (application key, reference seed) and stopping at
//! the first failure.

pub mod runner;
pub mod steps;

pub use runner::{APP_KEY_PREFIX, ProvisionReport, ProvisionRunner, StepOutcome};
pub use steps::ProvisionStep;
