// src/shared/env.rs

use tracing::info;

use crate::config::DeployConfig;
use crate::errors::{CommandError, Result, RolloutError};
use crate::release::{Layout, ReleaseId};
use crate::remote::{PathKind, RemoteShell, Session};

use super::envfile::EnvFile;

/// What happened to the shared env file during a deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvOutcome {
    /// First deploy: created from the release's template.
    Created,
    /// Existing file backed up and rewritten in place.
    Reconciled { backup: String },
}

/// Create or reconcile `<root>/.env` and link the release to it.
pub async fn reconcile_env<S: RemoteShell>(
    session: &mut Session<S>,
    layout: &Layout,
    id: &ReleaseId,
    config: &DeployConfig,
) -> Result<EnvOutcome> {
    let shared = layout.shared_env();
    let fail = |what: &str, e: CommandError| RolloutError::Reconciliation(format!("{what}: {e}"));

    let outcome = match session
        .path_kind(&shared)
        .await
        .map_err(|e| fail("inspecting shared env file", e))?
    {
        PathKind::Missing => {
            let template = layout.release_env_template(id);
            if !session
                .exists(&template)
                .await
                .map_err(|e| fail("inspecting env template", e))?
            {
                return Err(RolloutError::Reconciliation(format!(
                    "release has no {} to create the shared env file from",
                    template.display()
                )));
            }
            session
                .copy_file(&template, &shared)
                .await
                .map_err(|e| fail("creating shared env file", e))?;
            info!(release = %id, "created shared env file from template");
            EnvOutcome::Created
        }
        PathKind::File => {
            let backup = layout.env_backup(id);
            session
                .copy_file(&shared, &backup)
                .await
                .map_err(|e| fail("backing up shared env file", e))?;
            info!(release = %id, backup = %backup.display(), "backed up shared env file");
            EnvOutcome::Reconciled {
                backup: backup.display().to_string(),
            }
        }
        PathKind::Dir | PathKind::Symlink => {
            return Err(RolloutError::Reconciliation(format!(
                "{} is not a regular file",
                shared.display()
            )));
        }
    };

    let contents = session
        .read_file(&shared)
        .await
        .map_err(|e| fail("reading shared env file", e))?;
    let mut env = EnvFile::parse(&contents);
    env.set_all(&config.env_assignments());
    session
        .write_file(&shared, env.render())
        .await
        .map_err(|e| fail("writing shared env file", e))?;

    session
        .symlink(&Layout::env_link_target(), &layout.release_env(id))
        .await
        .map_err(|e| fail("linking release env file", e))?;

    Ok(outcome)
}
