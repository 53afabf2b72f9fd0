// src/release/activator.rs

use std::path::PathBuf;

use tracing::{info, warn};

use crate::errors::{CommandError, Result, RolloutError};
use crate::remote::{PathKind, RemoteShell, Session};
use crate::types::ReleaseState;

use super::id::ReleaseId;
use super::layout::Layout;
use super::Release;

/// Point `current` at `release`.
///
/// A new alias is created under a temporary name and renamed over the old
/// one, so `current` always resolves to some release. Returns the release
/// that was live before, now retired.
pub async fn activate<S: RemoteShell>(
    session: &mut Session<S>,
    layout: &Layout,
    release: &mut Release,
) -> Result<Option<Release>> {
    let current = layout.current();
    let activation = |e: CommandError| RolloutError::Activation(e.to_string());

    let previous = match session.path_kind(&current).await.map_err(activation)? {
        PathKind::Missing => None,
        PathKind::Symlink => session
            .read_link(&current)
            .await
            .map_err(activation)?
            .and_then(|target| Layout::release_from_link(&target)),
        PathKind::File | PathKind::Dir => {
            return Err(RolloutError::Activation(format!(
                "{} exists and is not a symlink; refusing to replace it",
                current.display()
            )));
        }
    };

    let pending = layout.pending_current(&release.id);
    let target = PathBuf::from(release.id.as_str());

    session
        .symlink(&target, &pending)
        .await
        .map_err(activation)?;

    if let Err(e) = session.rename(&pending, &current).await {
        if let Err(cleanup) = session.remove_file(&pending).await {
            warn!(error = %cleanup, "could not remove pending alias");
        }
        return Err(activation(e));
    }

    release.activate();
    info!(release = %release.id, previous = ?previous.as_ref().map(ReleaseId::as_str), "release is live");

    Ok(previous
        .filter(|id| *id != release.id)
        .map(|id| Release::new(id, ReleaseState::Retired)))
}
