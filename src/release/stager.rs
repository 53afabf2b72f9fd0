// src/release/stager.rs

use tracing::{info, warn};

use crate::config::RepositoryConfig;
use crate::errors::{Result, RolloutError};
use crate::remote::{RemoteShell, Session};

use super::id::ReleaseId;
use super::layout::Layout;
use super::Release;

/// Create `<root>/<id>` from a shallow clone of the configured branch.
///
/// On failure nothing is left behind: a partially cloned directory is
/// removed before the `Retrieval` error is returned.
pub async fn stage<S: RemoteShell>(
    session: &mut Session<S>,
    layout: &Layout,
    repository: &RepositoryConfig,
    id: &ReleaseId,
) -> Result<Release> {
    let dest = layout.release(id);
    info!(release = %id, branch = %repository.branch, "staging release");

    session
        .ensure_dir(layout.root())
        .await
        .map_err(|e| RolloutError::Retrieval(format!("preparing target directory: {e}")))?;

    if session
        .exists(&dest)
        .await
        .map_err(|e| RolloutError::Retrieval(e.to_string()))?
    {
        return Err(RolloutError::Retrieval(format!(
            "release directory {} already exists",
            dest.display()
        )));
    }

    if let Err(e) = session
        .clone_repository(&repository.url, &repository.branch, &dest)
        .await
    {
        if let Err(cleanup) = session.remove_dir(&dest).await {
            warn!(release = %id, error = %cleanup, "could not remove partial clone");
        }
        return Err(RolloutError::Retrieval(format!(
            "fetching branch '{}' of {}: {e}",
            repository.branch, repository.url
        )));
    }

    Ok(Release::staged(id.clone()))
}
