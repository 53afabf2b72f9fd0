// src/release/retention.rs

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::errors::RolloutError;
use crate::remote::{RemoteShell, Session};

use super::id::ReleaseId;
use super::layout::Layout;

/// Which releases a cleanup pass keeps and which it removes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    /// Ascending.
    pub keep: Vec<ReleaseId>,
    /// Ascending (oldest first).
    pub remove: Vec<ReleaseId>,
    pub active: Option<ReleaseId>,
}

/// Keep the `keep` newest releases plus the active one; remove the rest.
///
/// Duplicates in `releases` are ignored. A `keep` of zero keeps only the
/// active release.
pub fn plan_retention(
    releases: &[ReleaseId],
    active: Option<&ReleaseId>,
    keep: usize,
) -> RetentionPlan {
    let sorted: BTreeSet<&ReleaseId> = releases.iter().collect();
    let cutoff = sorted.len().saturating_sub(keep);

    let mut plan = RetentionPlan {
        active: active.cloned(),
        ..RetentionPlan::default()
    };
    for (i, id) in sorted.into_iter().enumerate() {
        if i >= cutoff || Some(id) == active {
            plan.keep.push(id.clone());
        } else {
            plan.remove.push(id.clone());
        }
    }
    plan
}

/// Outcome of executing a [`RetentionPlan`].
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub plan: RetentionPlan,
    pub removed: Vec<ReleaseId>,
    /// Releases that could not be removed, with the error. Non-fatal.
    pub failed: Vec<(ReleaseId, RolloutError)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Delete every release in `plan.remove`, continuing past failures.
pub async fn execute_plan<S: RemoteShell>(
    session: &mut Session<S>,
    layout: &Layout,
    plan: RetentionPlan,
) -> CleanupReport {
    let mut report = CleanupReport::default();

    for id in &plan.remove {
        // The plan never lists the active release; checked again here
        // because deleting it would take the site down.
        if plan.active.as_ref() == Some(id) {
            continue;
        }
        match session.remove_dir(&layout.release(id)).await {
            Ok(()) => {
                info!(release = %id, "removed old release");
                report.removed.push(id.clone());
            }
            Err(e) => {
                warn!(release = %id, error = %e, "failed to remove old release");
                report
                    .failed
                    .push((id.clone(), RolloutError::Cleanup(format!("removing {id}: {e}"))));
            }
        }
    }

    report.plan = plan;
    report
}
