// src/release/mod.rs

//! Release directories and their lifecycle.
//!
//! - [`id`]: sortable timestamp identifiers.
//! - [`layout`]: every path under the target directory.
//! - [`stager`]: clone a branch into a fresh release directory.
//! - [`activator`]: switch the `current` alias.
//! - [`retention`]: decide and delete releases outside the retention window.

pub mod activator;
pub mod id;
pub mod layout;
pub mod retention;
pub mod stager;

use tracing::debug;

use crate::errors::CommandError;
use crate::remote::{RemoteShell, Session};
use crate::types::ReleaseState;

pub use activator::activate;
pub use id::ReleaseId;
pub use layout::Layout;
pub use retention::{CleanupReport, RetentionPlan, execute_plan, plan_retention};
pub use stager::stage;

/// One release directory and where it is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub id: ReleaseId,
    pub state: ReleaseState,
}

impl Release {
    pub fn new(id: ReleaseId, state: ReleaseState) -> Self {
        Self { id, state }
    }

    pub fn staged(id: ReleaseId) -> Self {
        Self::new(id, ReleaseState::Staged)
    }

    pub fn activate(&mut self) {
        self.state = ReleaseState::Active;
    }
}

/// Release directories on the target, ascending, plus the active one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub releases: Vec<ReleaseId>,
    pub active: Option<ReleaseId>,
}

impl Inventory {
    pub fn newest(&self) -> Option<&ReleaseId> {
        self.releases.last()
    }

    /// Every release with its state; anything not active is retired.
    pub fn states(&self) -> Vec<Release> {
        self.releases
            .iter()
            .map(|id| {
                let state = if self.active.as_ref() == Some(id) {
                    ReleaseState::Active
                } else {
                    ReleaseState::Retired
                };
                Release::new(id.clone(), state)
            })
            .collect()
    }
}

/// List release directories under the target root.
///
/// Only entries whose name is a release identifier count; `current`,
/// `.env*`, `storage` and anything else are ignored. A missing root yields
/// an empty inventory.
pub async fn inventory<S: RemoteShell>(
    session: &mut Session<S>,
    layout: &Layout,
) -> Result<Inventory, CommandError> {
    if !session.exists(layout.root()).await? {
        debug!(root = %layout.root().display(), "target directory does not exist yet");
        return Ok(Inventory::default());
    }

    let mut releases: Vec<ReleaseId> = session
        .list_dir(layout.root())
        .await?
        .iter()
        .filter_map(|name| ReleaseId::parse(name))
        .collect();
    releases.sort();

    let active = session
        .read_link(&layout.current())
        .await?
        .and_then(|target| Layout::release_from_link(&target));

    Ok(Inventory { releases, active })
}
