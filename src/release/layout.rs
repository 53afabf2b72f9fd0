// src/release/layout.rs

use std::path::{Path, PathBuf};

use super::id::ReleaseId;

/// Name of the alias pointing at the active release.
pub const CURRENT: &str = "current";
/// Shared environment file.
pub const ENV_FILE: &str = ".env";
/// Template shipped inside every release.
pub const ENV_TEMPLATE: &str = ".env.example";
/// Shared persistent storage directory.
pub const STORAGE: &str = "storage";
/// Framework cache directory inside a release.
pub const BOOTSTRAP_CACHE: &str = "bootstrap/cache";

/// Paths under the target directory.
///
/// ```text
/// <root>/
///   current -> 20261018113500
///   20261017090000/
///   20261018113500/
///   .env
///   .env-20261018113500.bak
///   storage/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current(&self) -> PathBuf {
        self.root.join(CURRENT)
    }

    /// Temporary alias created before being renamed over `current`.
    pub fn pending_current(&self, id: &ReleaseId) -> PathBuf {
        self.root.join(format!("{CURRENT}.{id}.tmp"))
    }

    pub fn release(&self, id: &ReleaseId) -> PathBuf {
        self.root.join(id.as_str())
    }

    pub fn shared_env(&self) -> PathBuf {
        self.root.join(ENV_FILE)
    }

    pub fn env_backup(&self, id: &ReleaseId) -> PathBuf {
        self.root.join(format!("{ENV_FILE}-{id}.bak"))
    }

    pub fn shared_storage(&self) -> PathBuf {
        self.root.join(STORAGE)
    }

    pub fn release_env(&self, id: &ReleaseId) -> PathBuf {
        self.release(id).join(ENV_FILE)
    }

    pub fn release_env_template(&self, id: &ReleaseId) -> PathBuf {
        self.release(id).join(ENV_TEMPLATE)
    }

    pub fn release_storage(&self, id: &ReleaseId) -> PathBuf {
        self.release(id).join(STORAGE)
    }

    pub fn release_cache(&self, id: &ReleaseId) -> PathBuf {
        self.release(id).join(BOOTSTRAP_CACHE)
    }

    /// Link target stored in a release's `.env` (relative, so the tree can
    /// be moved as a whole).
    pub fn env_link_target() -> PathBuf {
        Path::new("..").join(ENV_FILE)
    }

    pub fn storage_link_target() -> PathBuf {
        Path::new("..").join(STORAGE)
    }

    /// Release an alias target refers to. Accepts both the relative form
    /// this tool writes (`20261018113500`) and absolute targets.
    pub fn release_from_link(target: &Path) -> Option<ReleaseId> {
        let name = target.file_name()?.to_str()?;
        ReleaseId::parse(name)
    }
}
