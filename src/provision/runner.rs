// src/provision/runner.rs

use tracing::info;

use crate::config::DeployConfig;
use crate::errors::{Result, RolloutError};
use crate::release::{Layout, ReleaseId};
use crate::remote::{RemoteShell, Session};
use crate::shared::EnvFile;

use super::steps::{ProvisionStep, row_count_command, seed_command, step_command};

/// Prefix of a generated application key.
pub const APP_KEY_PREFIX: &str = "base64:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Ran,
    Skipped(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    pub steps: Vec<(ProvisionStep, StepOutcome)>,
}

impl ProvisionReport {
    pub fn outcome(&self, step: ProvisionStep) -> Option<&StepOutcome> {
        self.steps.iter().find(|(s, _)| *s == step).map(|(_, o)| o)
    }

    pub fn ran(&self, step: ProvisionStep) -> bool {
        matches!(self.outcome(step), Some(StepOutcome::Ran))
    }

    pub fn skipped(&self, step: ProvisionStep) -> bool {
        matches!(self.outcome(step), Some(StepOutcome::Skipped(_)))
    }
}

/// Runs the provisioning steps against the active release.
pub struct ProvisionRunner<'a> {
    config: &'a DeployConfig,
    layout: &'a Layout,
    release: &'a ReleaseId,
}

impl<'a> ProvisionRunner<'a> {
    pub fn new(config: &'a DeployConfig, layout: &'a Layout, release: &'a ReleaseId) -> Self {
        Self {
            config,
            layout,
            release,
        }
    }

    /// Run every step in order. The first failure aborts the remaining
    /// steps; the release stays active.
    pub async fn run<S: RemoteShell>(&self, session: &mut Session<S>) -> Result<ProvisionReport> {
        let mut report = ProvisionReport::default();
        for step in ProvisionStep::ALL {
            info!(release = %self.release, step = %step, "provisioning");
            let outcome = self.run_step(session, step).await?;
            if let StepOutcome::Skipped(reason) = &outcome {
                info!(step = %step, reason = %reason, "step skipped");
            }
            report.steps.push((step, outcome));
        }
        Ok(report)
    }

    async fn run_step<S: RemoteShell>(
        &self,
        session: &mut Session<S>,
        step: ProvisionStep,
    ) -> Result<StepOutcome> {
        let release_dir = self.layout.release(self.release);
        let provision = &self.config.provision;

        match step {
            ProvisionStep::GenerateKey => {
                if self.has_app_key(session).await? {
                    return Ok(StepOutcome::Skipped("application key already set".into()));
                }
            }
            ProvisionStep::Seed => {
                let Some(seed) = &provision.seed else {
                    return Ok(StepOutcome::Skipped("no seed configured".into()));
                };
                let rows = self.row_count(session, &seed.table).await?;
                if rows > 0 {
                    return Ok(StepOutcome::Skipped(format!(
                        "table {} already has {rows} rows",
                        seed.table
                    )));
                }
                session
                    .exec(seed_command(&release_dir, &provision.php, seed))
                    .await
                    .map_err(|e| RolloutError::provisioning(step, e))?;
                return Ok(StepOutcome::Ran);
            }
            _ => {}
        }

        if let Some(request) = step_command(step, &release_dir, provision) {
            session
                .exec(request)
                .await
                .map_err(|e| RolloutError::provisioning(step, e))?;
        }
        Ok(StepOutcome::Ran)
    }

    async fn has_app_key<S: RemoteShell>(&self, session: &mut Session<S>) -> Result<bool> {
        let contents = session
            .read_file(&self.layout.shared_env())
            .await
            .map_err(|e| RolloutError::provisioning(ProvisionStep::GenerateKey, e))?;
        Ok(EnvFile::parse(&contents)
            .get("APP_KEY")
            .is_some_and(|key| key.starts_with(APP_KEY_PREFIX)))
    }

    async fn row_count<S: RemoteShell>(&self, session: &mut Session<S>, table: &str) -> Result<u64> {
        let request = row_count_command(
            &self.layout.release(self.release),
            &self.config.provision.mysql,
            &self.config.database,
            table,
        );
        let output = session
            .exec(request)
            .await
            .map_err(|e| RolloutError::provisioning(ProvisionStep::Seed, e))?;
        let last = output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .last()
            .unwrap_or("");
        last.parse::<u64>().map_err(|_| {
            RolloutError::provisioning(
                ProvisionStep::Seed,
                format!("could not read row count of {table} from {last:?}"),
            )
        })
    }
}
