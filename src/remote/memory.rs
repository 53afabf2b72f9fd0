// src/remote/memory.rs

//! In-memory target host.
//!
//! `MemoryShell` interprets [`RemoteCommand`]s against a map of paths to
//! files, directories and symlinks instead of running a shell. Repositories
//! are fixtures registered up front; application commands (`Exec`) go to an
//! optional handler that may inspect and mutate the filesystem.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::CommandError;

use super::backend::{CommandOutput, RemoteShell, ShellFuture};
use super::command::{ExecRequest, RemoteCommand};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryEntry {
    File(String),
    Dir,
    Symlink(PathBuf),
}

/// Filesystem model: normalized relative paths to entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    entries: BTreeMap<PathBuf, MemoryEntry>,
    group_access: BTreeSet<PathBuf>,
}

/// Lexically normalize `path`: drop `.`, fold `..`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, path: impl AsRef<Path>) -> Option<&MemoryEntry> {
        self.entries.get(&normalize(path.as_ref()))
    }

    /// Follow symlinks in every component of `path`.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let mut current = normalize(path.as_ref());
        for _ in 0..40 {
            let mut prefix = PathBuf::new();
            let mut rewritten = None;
            let comps: Vec<_> = current.components().collect();
            for (i, comp) in comps.iter().enumerate() {
                prefix.push(comp.as_os_str());
                if let Some(MemoryEntry::Symlink(target)) = self.entries.get(&prefix) {
                    let base = prefix.parent().map(Path::to_path_buf).unwrap_or_default();
                    let mut next = base.join(target);
                    for rest in &comps[i + 1..] {
                        next.push(rest.as_os_str());
                    }
                    rewritten = Some(normalize(&next));
                    break;
                }
            }
            match rewritten {
                Some(next) => current = next,
                None => return current,
            }
        }
        current
    }

    fn ensure_parents(&mut self, path: &Path) {
        let mut prefix = PathBuf::new();
        if let Some(parent) = path.parent() {
            for comp in parent.components() {
                prefix.push(comp.as_os_str());
                self.entries
                    .entry(prefix.clone())
                    .or_insert(MemoryEntry::Dir);
            }
        }
    }

    pub fn create_dir_all(&mut self, path: impl AsRef<Path>) {
        let path = self.resolve(path);
        self.ensure_parents(&path);
        self.entries.entry(path).or_insert(MemoryEntry::Dir);
    }

    pub fn write_file(&mut self, path: impl AsRef<Path>, contents: impl Into<String>) {
        let path = self.resolve(path);
        self.ensure_parents(&path);
        self.entries.insert(path, MemoryEntry::File(contents.into()));
    }

    pub fn read_file(&self, path: impl AsRef<Path>) -> Option<String> {
        match self.entries.get(&self.resolve(path)) {
            Some(MemoryEntry::File(contents)) => Some(contents.clone()),
            _ => None,
        }
    }

    /// Create `link` pointing at `target` (replacing a file or link there).
    pub fn symlink(&mut self, target: impl Into<PathBuf>, link: impl AsRef<Path>) {
        let link = normalize(link.as_ref());
        self.ensure_parents(&link);
        self.entries.insert(link, MemoryEntry::Symlink(target.into()));
    }

    pub fn read_link(&self, path: impl AsRef<Path>) -> Option<PathBuf> {
        match self.entry(path) {
            Some(MemoryEntry::Symlink(target)) => Some(target.clone()),
            _ => None,
        }
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.entries.contains_key(&self.resolve(path))
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        matches!(self.entries.get(&self.resolve(path)), Some(MemoryEntry::Dir))
    }

    pub fn is_symlink(&self, path: impl AsRef<Path>) -> bool {
        matches!(self.entry(path), Some(MemoryEntry::Symlink(_)))
    }

    pub fn has_group_access(&self, path: impl AsRef<Path>) -> bool {
        self.group_access.contains(&self.resolve(path))
    }

    /// Names of the direct children of `path`, sorted.
    pub fn list_dir(&self, path: impl AsRef<Path>) -> Option<Vec<String>> {
        let dir = self.resolve(path);
        if !dir.as_os_str().is_empty() && !matches!(self.entries.get(&dir), Some(MemoryEntry::Dir))
        {
            return None;
        }
        Some(
            self.entries
                .keys()
                .filter(|p| p.parent() == Some(dir.as_path()))
                .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .collect(),
        )
    }

    /// Remove `path` and everything beneath it, without following a
    /// symlink at `path` itself.
    pub fn remove_all(&mut self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        let doomed: Vec<PathBuf> = self
            .entries
            .keys()
            .filter(|p| p.starts_with(&path))
            .cloned()
            .collect();
        for p in doomed {
            self.entries.remove(&p);
            self.group_access.remove(&p);
        }
    }

    /// Move `from` (and its subtree) to `to`, replacing whatever is at `to`.
    pub fn rename(&mut self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> bool {
        let from = normalize(from.as_ref());
        let to = normalize(to.as_ref());
        if !self.entries.contains_key(&from) {
            return false;
        }
        self.remove_all(&to);
        let moved: Vec<(PathBuf, MemoryEntry)> = self
            .entries
            .iter()
            .filter(|(p, _)| p.starts_with(&from))
            .map(|(p, e)| (p.clone(), e.clone()))
            .collect();
        for (old, entry) in moved {
            self.entries.remove(&old);
            let suffix = old.strip_prefix(&from).map(Path::to_path_buf).unwrap_or_default();
            let new = if suffix.as_os_str().is_empty() {
                to.clone()
            } else {
                to.join(suffix)
            };
            if self.group_access.remove(&old) {
                self.group_access.insert(new.clone());
            }
            self.entries.insert(new, entry);
        }
        self.ensure_parents(&to);
        true
    }

    /// Mark `path` and its subtree as group-accessible.
    pub fn grant_group_access(&mut self, path: impl AsRef<Path>) -> bool {
        let root = self.resolve(path);
        if !self.entries.contains_key(&root) {
            return false;
        }
        let marked: Vec<PathBuf> = self
            .entries
            .keys()
            .filter(|p| p.starts_with(&root))
            .cloned()
            .collect();
        self.group_access.extend(marked);
        true
    }

    /// Paths directly or transitively under `path` (unresolved).
    pub fn paths_under(&self, path: impl AsRef<Path>) -> Vec<PathBuf> {
        let path = normalize(path.as_ref());
        self.entries
            .keys()
            .filter(|p| p.starts_with(&path))
            .cloned()
            .collect()
    }
}

/// Files (path, contents) and empty directories a clone produces.
#[derive(Debug, Clone, Default)]
pub struct RepositoryFixture {
    pub files: Vec<(PathBuf, String)>,
    pub dirs: Vec<PathBuf>,
}

impl RepositoryFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files.push((path.into(), contents.into()));
        self
    }

    pub fn dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dirs.push(path.into());
        self
    }
}

/// Handler for application commands. Receives the request with `cwd`
/// already resolved through symlinks.
pub type ExecHandler = Box<dyn FnMut(&ExecRequest, &mut MemoryFs) -> CommandOutput + Send>;

struct MemoryState {
    fs: MemoryFs,
    repositories: HashMap<(String, String), RepositoryFixture>,
    history: Vec<RemoteCommand>,
    exec_handler: Option<ExecHandler>,
    fail_labels: Vec<String>,
}

/// In-memory `RemoteShell`. Clones share state, so a test can keep a handle
/// while the deployer owns another.
#[derive(Clone)]
pub struct MemoryShell {
    state: Arc<Mutex<MemoryState>>,
}

impl fmt::Debug for MemoryShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryShell").finish_non_exhaustive()
    }
}

impl Default for MemoryShell {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryShell {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                fs: MemoryFs::new(),
                repositories: HashMap::new(),
                history: Vec::new(),
                exec_handler: None,
                fail_labels: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panicking test thread must not hide the state from others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_repository(
        self,
        url: impl Into<String>,
        branch: impl Into<String>,
        fixture: RepositoryFixture,
    ) -> Self {
        self.lock()
            .repositories
            .insert((url.into(), branch.into()), fixture);
        self
    }

    pub fn with_exec_handler(self, handler: ExecHandler) -> Self {
        self.lock().exec_handler = Some(handler);
        self
    }

    /// Make every command whose label contains `fragment` exit with 1.
    pub fn fail_when(&self, fragment: impl Into<String>) {
        self.lock().fail_labels.push(fragment.into());
    }

    pub fn clear_failures(&self) {
        self.lock().fail_labels.clear();
    }

    /// Run `f` with access to the filesystem.
    pub fn with_fs<R>(&self, f: impl FnOnce(&mut MemoryFs) -> R) -> R {
        f(&mut self.lock().fs)
    }

    /// Every command executed so far, in order.
    pub fn history(&self) -> Vec<RemoteCommand> {
        self.lock().history.clone()
    }

    /// Application commands executed so far, as command lines.
    pub fn exec_lines(&self) -> Vec<String> {
        self.lock()
            .history
            .iter()
            .filter_map(|c| match c {
                RemoteCommand::Exec(req) => Some(req.command_line()),
                _ => None,
            })
            .collect()
    }

    fn apply(state: &mut MemoryState, command: &RemoteCommand) -> CommandOutput {
        let label = command.label();
        if state.fail_labels.iter().any(|f| label.contains(f.as_str())) {
            return CommandOutput::failed(1, format!("injected failure: {label}"));
        }

        let fs = &mut state.fs;
        match command {
            RemoteCommand::EnsureDir { path } => {
                if matches!(fs.entries.get(&fs.resolve(path)), Some(MemoryEntry::File(_))) {
                    return CommandOutput::failed(1, "mkdir: File exists");
                }
                fs.create_dir_all(path);
                CommandOutput::ok("")
            }
            RemoteCommand::PathKind { path } => {
                let kind = if fs.is_symlink(path) {
                    "link"
                } else if fs.is_dir(path) {
                    "dir"
                } else if fs.exists(path) {
                    "file"
                } else {
                    "missing"
                };
                CommandOutput::ok(format!("{kind}\n"))
            }
            RemoteCommand::ReadFile { path } => match fs.read_file(path) {
                Some(contents) => CommandOutput::ok(contents),
                None => CommandOutput::failed(1, "cat: No such file or directory"),
            },
            RemoteCommand::WriteFile { path, contents } => {
                fs.write_file(path, contents.clone());
                CommandOutput::ok("")
            }
            RemoteCommand::CopyFile { from, to } => match fs.read_file(from) {
                Some(contents) => {
                    fs.write_file(to, contents);
                    CommandOutput::ok("")
                }
                None => CommandOutput::failed(1, "cp: cannot stat: No such file or directory"),
            },
            RemoteCommand::Rename { from, to } => {
                if fs.is_dir(to) && !fs.is_symlink(to) && !fs.is_dir(from) {
                    return CommandOutput::failed(1, "mv: cannot overwrite directory");
                }
                if fs.rename(from, to) {
                    CommandOutput::ok("")
                } else {
                    CommandOutput::failed(1, "mv: cannot stat: No such file or directory")
                }
            }
            RemoteCommand::Symlink { target, link } => {
                if fs.is_dir(link) && !fs.is_symlink(link) {
                    // `ln -sfn` places the link inside an existing directory.
                    fs.symlink(target.clone(), link.join(target.file_name().unwrap_or_default()));
                } else {
                    fs.symlink(target.clone(), link);
                }
                CommandOutput::ok("")
            }
            RemoteCommand::ReadLink { path } => match fs.read_link(path) {
                Some(target) => CommandOutput::ok(format!("{}\n", target.display())),
                None => CommandOutput::ok(""),
            },
            RemoteCommand::ListDir { path } => match fs.list_dir(path) {
                Some(names) => {
                    let mut out = names.join("\n");
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    CommandOutput::ok(out)
                }
                None => CommandOutput::failed(2, "ls: cannot access: No such file or directory"),
            },
            RemoteCommand::RemoveFile { path } | RemoteCommand::RemoveDir { path } => {
                fs.remove_all(path);
                CommandOutput::ok("")
            }
            RemoteCommand::GrantGroupAccess { path, .. } => {
                if fs.grant_group_access(path) {
                    CommandOutput::ok("")
                } else {
                    CommandOutput::failed(1, "setfacl: No such file or directory")
                }
            }
            RemoteCommand::Clone {
                repository,
                branch,
                dest,
            } => {
                let key = (repository.clone(), branch.clone());
                let Some(fixture) = state.repositories.get(&key) else {
                    return CommandOutput::failed(
                        128,
                        format!("fatal: Remote branch {branch} not found in upstream origin"),
                    );
                };
                if fs.exists(dest) {
                    return CommandOutput::failed(
                        128,
                        "fatal: destination path already exists and is not an empty directory",
                    );
                }
                fs.create_dir_all(dest);
                for dir in &fixture.dirs {
                    fs.create_dir_all(dest.join(dir));
                }
                for (path, contents) in &fixture.files {
                    fs.write_file(dest.join(path), contents.clone());
                }
                CommandOutput::ok("")
            }
            RemoteCommand::Exec(req) => {
                if !fs.is_dir(&req.cwd) {
                    return CommandOutput::failed(2, "cd: can't cd: No such file or directory");
                }
                let mut resolved = req.clone();
                resolved.cwd = fs.resolve(&req.cwd);
                match state.exec_handler.as_mut() {
                    Some(handler) => handler(&resolved, &mut state.fs),
                    None => CommandOutput::ok(""),
                }
            }
        }
    }
}

impl RemoteShell for MemoryShell {
    fn execute(&mut self, command: RemoteCommand) -> ShellFuture<'_> {
        let output = {
            let mut state = self.lock();
            state.history.push(command.clone());
            Self::apply(&mut state, &command)
        };
        Box::pin(async move { Ok::<_, CommandError>(output) })
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
