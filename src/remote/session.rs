// src/remote/session.rs

//! Typed helpers over a [`RemoteShell`].

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::CommandError;

use super::backend::{CommandOutput, RemoteShell};
use super::command::{ExecRequest, RemoteCommand};

type CmdResult<T> = Result<T, CommandError>;

/// What sits at a path on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Missing,
    File,
    Dir,
    Symlink,
}

/// A shell plus the typed operations the release lifecycle needs.
///
/// Every helper is blocking from the caller's point of view: it resolves
/// only once the command has finished on the target.
#[derive(Debug)]
pub struct Session<S> {
    shell: S,
}

impl<S: RemoteShell> Session<S> {
    pub fn new(shell: S) -> Self {
        Self { shell }
    }

    pub fn shell(&self) -> &S {
        &self.shell
    }

    pub fn into_inner(self) -> S {
        self.shell
    }

    pub fn describe(&self) -> String {
        self.shell.describe()
    }

    /// Run a command and return its output whatever the exit status.
    pub async fn run_unchecked(&mut self, command: RemoteCommand) -> CmdResult<CommandOutput> {
        debug!(target_host = %self.shell.describe(), command = %command, "remote");
        self.shell.execute(command).await
    }

    /// Run a command; a non-zero exit becomes `CommandError::Failed`.
    pub async fn run(&mut self, command: RemoteCommand) -> CmdResult<CommandOutput> {
        let label = command.label();
        let output = self.run_unchecked(command).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(CommandError::Failed {
                command: label,
                status: output.status,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }

    pub async fn ensure_dir(&mut self, path: &Path) -> CmdResult<()> {
        self.run(RemoteCommand::EnsureDir {
            path: path.to_path_buf(),
        })
        .await
        .map(|_| ())
    }

    pub async fn path_kind(&mut self, path: &Path) -> CmdResult<PathKind> {
        let command = RemoteCommand::PathKind {
            path: path.to_path_buf(),
        };
        let label = command.label();
        let output = self.run(command).await?;
        match output.stdout.trim() {
            "missing" => Ok(PathKind::Missing),
            "file" => Ok(PathKind::File),
            "dir" => Ok(PathKind::Dir),
            "link" => Ok(PathKind::Symlink),
            other => Err(CommandError::UnexpectedOutput {
                command: label,
                output: other.to_string(),
            }),
        }
    }

    pub async fn exists(&mut self, path: &Path) -> CmdResult<bool> {
        Ok(self.path_kind(path).await? != PathKind::Missing)
    }

    pub async fn read_file(&mut self, path: &Path) -> CmdResult<String> {
        self.run(RemoteCommand::ReadFile {
            path: path.to_path_buf(),
        })
        .await
        .map(|o| o.stdout)
    }

    pub async fn write_file(&mut self, path: &Path, contents: String) -> CmdResult<()> {
        self.run(RemoteCommand::WriteFile {
            path: path.to_path_buf(),
            contents,
        })
        .await
        .map(|_| ())
    }

    pub async fn copy_file(&mut self, from: &Path, to: &Path) -> CmdResult<()> {
        self.run(RemoteCommand::CopyFile {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        })
        .await
        .map(|_| ())
    }

    pub async fn rename(&mut self, from: &Path, to: &Path) -> CmdResult<()> {
        self.run(RemoteCommand::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        })
        .await
        .map(|_| ())
    }

    pub async fn symlink(&mut self, target: &Path, link: &Path) -> CmdResult<()> {
        self.run(RemoteCommand::Symlink {
            target: target.to_path_buf(),
            link: link.to_path_buf(),
        })
        .await
        .map(|_| ())
    }

    /// Literal target of the symlink at `path`, or `None` if it is not one.
    pub async fn read_link(&mut self, path: &Path) -> CmdResult<Option<PathBuf>> {
        let output = self
            .run(RemoteCommand::ReadLink {
                path: path.to_path_buf(),
            })
            .await?;
        let target = output.stdout.trim_end_matches(['\n', '\r']);
        if target.is_empty() {
            Ok(None)
        } else {
            Ok(Some(PathBuf::from(target)))
        }
    }

    pub async fn list_dir(&mut self, path: &Path) -> CmdResult<Vec<String>> {
        let output = self
            .run(RemoteCommand::ListDir {
                path: path.to_path_buf(),
            })
            .await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub async fn remove_file(&mut self, path: &Path) -> CmdResult<()> {
        self.run(RemoteCommand::RemoveFile {
            path: path.to_path_buf(),
        })
        .await
        .map(|_| ())
    }

    pub async fn remove_dir(&mut self, path: &Path) -> CmdResult<()> {
        self.run(RemoteCommand::RemoveDir {
            path: path.to_path_buf(),
        })
        .await
        .map(|_| ())
    }

    pub async fn grant_group_access(&mut self, path: &Path, group: &str) -> CmdResult<()> {
        self.run(RemoteCommand::GrantGroupAccess {
            path: path.to_path_buf(),
            group: group.to_string(),
        })
        .await
        .map(|_| ())
    }

    pub async fn clone_repository(
        &mut self,
        repository: &str,
        branch: &str,
        dest: &Path,
    ) -> CmdResult<()> {
        self.run(RemoteCommand::Clone {
            repository: repository.to_string(),
            branch: branch.to_string(),
            dest: dest.to_path_buf(),
        })
        .await
        .map(|_| ())
    }

    pub async fn exec(&mut self, request: ExecRequest) -> CmdResult<CommandOutput> {
        self.run(RemoteCommand::Exec(request)).await
    }
}
