// src/config/mod.rs

//! Deployment configuration.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file and overlay environment variables (`loader.rs`).
//! - Check required values and turn the raw form into `DeployConfig`
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{apply_env_overrides, load_and_validate, load_from_path};
pub use model::{
    AppConfig, DatabaseConfig, DeployConfig, MailSettings, NotifySettings, ProvisionConfig,
    RawDeployConfig, RepositoryConfig, RetentionPolicy, SeedConfig, TargetConfig,
};
