// src/shared/storage.rs

use tracing::info;

use crate::errors::{CommandError, Result, RolloutError};
use crate::release::{Layout, ReleaseId};
use crate::remote::{PathKind, RemoteShell, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOutcome {
    /// First deploy: the release's bundled storage became the shared one.
    Promoted,
    /// Shared storage already existed; the bundled copy was discarded.
    Reused,
}

/// Make `<root>/storage` the single storage directory and link the release
/// to it. Also opens the release's framework cache to the web group.
pub async fn reconcile_storage<S: RemoteShell>(
    session: &mut Session<S>,
    layout: &Layout,
    id: &ReleaseId,
    web_group: &str,
) -> Result<StorageOutcome> {
    let shared = layout.shared_storage();
    let bundled = layout.release_storage(id);
    let fail = |what: &str, e: CommandError| RolloutError::Reconciliation(format!("{what}: {e}"));

    let outcome = match session
        .path_kind(&shared)
        .await
        .map_err(|e| fail("inspecting shared storage", e))?
    {
        PathKind::Missing => {
            if session
                .path_kind(&bundled)
                .await
                .map_err(|e| fail("inspecting release storage", e))?
                != PathKind::Dir
            {
                return Err(RolloutError::Reconciliation(format!(
                    "no shared storage yet and the release has no {} directory to promote",
                    bundled.display()
                )));
            }
            session
                .rename(&bundled, &shared)
                .await
                .map_err(|e| fail("promoting release storage", e))?;
            session
                .grant_group_access(&shared, web_group)
                .await
                .map_err(|e| fail("setting storage permissions", e))?;
            info!(release = %id, "promoted release storage to shared storage");
            StorageOutcome::Promoted
        }
        PathKind::Dir => {
            session
                .remove_dir(&bundled)
                .await
                .map_err(|e| fail("discarding bundled storage", e))?;
            info!(release = %id, "reusing existing shared storage");
            StorageOutcome::Reused
        }
        PathKind::File | PathKind::Symlink => {
            return Err(RolloutError::Reconciliation(format!(
                "{} is not a directory",
                shared.display()
            )));
        }
    };

    session
        .grant_group_access(&layout.release_cache(id), web_group)
        .await
        .map_err(|e| fail("setting cache permissions", e))?;

    session
        .symlink(&Layout::storage_link_target(), &bundled)
        .await
        .map_err(|e| fail("linking release storage", e))?;

    Ok(outcome)
}
