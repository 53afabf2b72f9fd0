// src/errors.rs

//! Crate-wide error types.
//!
//! [`RolloutError`] is phase-tagged: every fatal failure says which part of
//! the release lifecycle it came from, so the CLI and the failure
//! notification can name the phase. [`CommandError`] is the lower-level
//! failure of a single remote command; components wrap it into their phase.

use thiserror::Error;

use crate::types::Phase;

#[derive(Error, Debug)]
pub enum RolloutError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("retrieval error: {0}")]
    Retrieval(String),

    #[error("reconciliation error: {0}")]
    Reconciliation(String),

    #[error("activation error: {0}")]
    Activation(String),

    #[error("provisioning error in step '{step}': {message}")]
    Provisioning { step: String, message: String },

    #[error("cleanup error: {0}")]
    Cleanup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RolloutError {
    /// Lifecycle phase this error belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            RolloutError::Configuration(_)
            | RolloutError::Toml(_)
            | RolloutError::Prompt(_) => Phase::Configure,
            RolloutError::Retrieval(_) => Phase::Stage,
            RolloutError::Reconciliation(_) => Phase::Reconcile,
            RolloutError::Activation(_) => Phase::Activate,
            RolloutError::Provisioning { .. } => Phase::Provision,
            RolloutError::Cleanup(_) => Phase::Cleanup,
            RolloutError::Io(_) | RolloutError::Other(_) => Phase::Configure,
        }
    }

    pub fn provisioning(step: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        RolloutError::Provisioning {
            step: step.to_string(),
            message: err.to_string(),
        }
    }
}

/// Failure of one remote command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("`{command}` exited with status {status}: {stderr}")]
    Failed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("transport failure running `{command}`: {message}")]
    Transport { command: String, message: String },

    #[error("unexpected output from `{command}`: {output:?}")]
    UnexpectedOutput { command: String, output: String },
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RolloutError>;
