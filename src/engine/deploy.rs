// src/engine/deploy.rs

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::DeployConfig;
use crate::errors::{Result, RolloutError};
use crate::provision::{ProvisionReport, ProvisionRunner};
use crate::release::{self, Layout, Release, ReleaseId};
use crate::remote::{RemoteShell, Session};
use crate::shared::{EnvOutcome, StorageOutcome, reconcile_env, reconcile_storage};
use crate::types::Phase;

/// Everything a successful deploy did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub release: Release,
    /// Release that was live before; retired, still on disk.
    pub previous: Option<Release>,
    pub env: EnvOutcome,
    pub storage: StorageOutcome,
    pub provision: ProvisionReport,
}

/// Drives one deployment: stage, reconcile, activate, provision.
///
/// Each phase sees the filesystem state left by the previous one. Failures
/// before activation leave `current` untouched and discard the staged
/// directory; a provisioning failure leaves the new release live.
#[derive(Debug)]
pub struct Deployer<'a, S> {
    session: Session<S>,
    config: &'a DeployConfig,
    layout: Layout,
}

impl<'a, S: RemoteShell> Deployer<'a, S> {
    pub fn new(shell: S, config: &'a DeployConfig) -> Self {
        Self {
            session: Session::new(shell),
            config,
            layout: Layout::new(&config.target.dir),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn into_session(self) -> Session<S> {
        self.session
    }

    pub async fn deploy(&mut self, now: DateTime<Utc>) -> Result<DeployReport> {
        let inventory = release::inventory(&mut self.session, &self.layout)
            .await
            .map_err(|e| RolloutError::Retrieval(format!("inspecting target: {e}")))?;
        let id = ReleaseId::generate(now, inventory.newest());

        info!(
            app = %self.config.app.name,
            host = %self.session.describe(),
            dir = %self.config.target.dir,
            release = %id,
            "deploying"
        );

        log_phase(Phase::Stage, &id);
        let mut staged = release::stage(
            &mut self.session,
            &self.layout,
            &self.config.repository,
            &id,
        )
        .await?;

        let (env, storage) = match self.reconcile(&id).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                self.discard(&id).await;
                return Err(e);
            }
        };

        log_phase(Phase::Activate, &id);
        let previous = match release::activate(&mut self.session, &self.layout, &mut staged).await
        {
            Ok(previous) => previous,
            Err(e) => {
                self.discard(&id).await;
                return Err(e);
            }
        };

        log_phase(Phase::Provision, &id);
        let provision = ProvisionRunner::new(self.config, &self.layout, &id)
            .run(&mut self.session)
            .await
            .inspect_err(|e| {
                error!(
                    release = %id,
                    error = %e,
                    "provisioning failed; release remains active, previous releases are kept for manual recovery"
                );
            })?;

        info!(release = %id, "deploy complete");
        Ok(DeployReport {
            release: staged,
            previous,
            env,
            storage,
            provision,
        })
    }

    async fn reconcile(&mut self, id: &ReleaseId) -> Result<(EnvOutcome, StorageOutcome)> {
        log_phase(Phase::Reconcile, id);
        let env = reconcile_env(&mut self.session, &self.layout, id, self.config).await?;
        let storage = reconcile_storage(
            &mut self.session,
            &self.layout,
            id,
            &self.config.provision.web_group,
        )
        .await?;
        Ok((env, storage))
    }

    /// Remove a release that never went live.
    async fn discard(&mut self, id: &ReleaseId) {
        let path = self.layout.release(id);
        match self.session.remove_dir(&path).await {
            Ok(()) => info!(release = %id, "discarded staged release"),
            Err(e) => warn!(release = %id, error = %e, "could not discard staged release"),
        }
    }
}

fn log_phase(phase: Phase, id: &ReleaseId) {
    info!(phase = %phase, release = %id, "phase started");
}
