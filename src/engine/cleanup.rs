// src/engine/cleanup.rs

use tracing::info;

use crate::errors::{Result, RolloutError};
use crate::release::{self, CleanupReport, Inventory, Layout, RetentionPlan, plan_retention};
use crate::remote::{RemoteShell, Session};

/// Retention pass over the release directories of one target.
#[derive(Debug)]
pub struct Cleaner<S> {
    session: Session<S>,
    layout: Layout,
    keep: usize,
}

impl<S: RemoteShell> Cleaner<S> {
    pub fn new(shell: S, layout: Layout, keep: usize) -> Self {
        Self {
            session: Session::new(shell),
            layout,
            keep,
        }
    }

    pub async fn inventory(&mut self) -> Result<Inventory> {
        release::inventory(&mut self.session, &self.layout)
            .await
            .map_err(|e| RolloutError::Cleanup(format!("listing releases: {e}")))
    }

    pub async fn plan(&mut self) -> Result<RetentionPlan> {
        let inventory = self.inventory().await?;
        Ok(plan_retention(
            &inventory.releases,
            inventory.active.as_ref(),
            self.keep,
        ))
    }

    /// Delete everything outside the retention window. Individual deletion
    /// failures are collected in the report, not returned as errors.
    pub async fn run(&mut self) -> Result<CleanupReport> {
        let plan = self.plan().await?;
        if plan.remove.is_empty() {
            info!(kept = plan.keep.len(), "nothing to clean up");
        }
        let report = release::execute_plan(&mut self.session, &self.layout, plan).await;
        info!(
            removed = report.removed.len(),
            failed = report.failed.len(),
            kept = report.plan.keep.len(),
            "cleanup finished"
        );
        Ok(report)
    }

    pub fn into_session(self) -> Session<S> {
        self.session
    }
}
