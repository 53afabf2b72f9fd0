// src/engine/mod.rs

//! Orchestration of the two externally triggered operations.
//!
//! - [`deploy`]: the strictly sequential release lifecycle.
//! - [`cleanup`]: the independent retention pass.

pub mod cleanup;
pub mod deploy;

pub use cleanup::Cleaner;
pub use deploy::{DeployReport, Deployer};
