// src/shared/mod.rs

//! State shared by every release: the environment file and the storage
//! directory. Both exist exactly once under the target root; each release
//! only links to them.

pub mod env;
pub mod envfile;
pub mod storage;

pub use env::{EnvOutcome, reconcile_env};
pub use envfile::EnvFile;
pub use storage::{StorageOutcome, reconcile_storage};
