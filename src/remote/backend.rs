// src/remote/backend.rs

//! Pluggable remote shell abstraction.
//!
//! The lifecycle talks to a `RemoteShell` instead of spawning ssh directly.
//! This makes it easy to swap in an in-memory target in tests while keeping
//! the production transport in [`process`](super::process).
//!
//! - `SshShell` runs every command on the target host over ssh.
//! - `LocalShell` runs the same shell snippets through a local `sh`.
//! - [`MemoryShell`](super::memory::MemoryShell) interprets commands against
//!   an in-memory filesystem.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tokio::process::Command;

use crate::config::TargetConfig;
use crate::errors::CommandError;

use super::command::RemoteCommand;
use super::process::run_process;

/// Exit status and captured output of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }
}

pub type ShellFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CommandOutput, CommandError>> + Send + 'a>>;

/// Trait abstracting how a remote command is carried out.
///
/// A non-zero exit is reported through `CommandOutput::status`, not as an
/// error; `Err` means the command could not be run at all.
pub trait RemoteShell: Send {
    fn execute(&mut self, command: RemoteCommand) -> ShellFuture<'_>;

    /// Human-readable name of the target (for logs and notifications).
    fn describe(&self) -> String;
}

/// Production transport: one `ssh` invocation per command.
#[derive(Debug, Clone)]
pub struct SshShell {
    destination: String,
    port: Option<u16>,
}

impl SshShell {
    pub fn new(target: &TargetConfig) -> Self {
        Self {
            destination: target.destination(),
            port: target.port,
        }
    }

    fn command(&self, script: &str) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.arg("-o").arg("BatchMode=yes");
        if let Some(port) = self.port {
            cmd.arg("-p").arg(port.to_string());
        }
        // ssh joins its remaining arguments and hands them to the remote
        // shell, so the script travels as one argument.
        cmd.arg(&self.destination).arg("--").arg(script);
        cmd
    }
}

impl RemoteShell for SshShell {
    fn execute(&mut self, command: RemoteCommand) -> ShellFuture<'_> {
        let cmd = self.command(&command.to_shell());
        Box::pin(async move { run_process(cmd, &command).await })
    }

    fn describe(&self) -> String {
        self.destination.clone()
    }
}

/// Runs commands through the local `sh`, optionally from a fixed directory.
#[derive(Debug, Clone, Default)]
pub struct LocalShell {
    workdir: Option<PathBuf>,
}

impl LocalShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative paths in commands resolve against `workdir`.
    pub fn in_dir(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(workdir.into()),
        }
    }
}

impl RemoteShell for LocalShell {
    fn execute(&mut self, command: RemoteCommand) -> ShellFuture<'_> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command.to_shell());
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
        Box::pin(async move { run_process(cmd, &command).await })
    }

    fn describe(&self) -> String {
        match &self.workdir {
            Some(dir) => format!("local:{}", dir.display()),
            None => "local".to_string(),
        }
    }
}

/// Shell backend for a configured target: `LocalShell` (rooted at `$HOME`,
/// like an ssh login) for the loopback names, `SshShell` otherwise.
pub fn shell_for(target: &TargetConfig) -> Box<dyn RemoteShell> {
    match target.server.as_str() {
        "local" | "localhost" | "127.0.0.1" => match std::env::var_os("HOME") {
            Some(home) => Box::new(LocalShell::in_dir(home)),
            None => Box::new(LocalShell::new()),
        },
        _ => Box::new(SshShell::new(target)),
    }
}

impl RemoteShell for Box<dyn RemoteShell> {
    fn execute(&mut self, command: RemoteCommand) -> ShellFuture<'_> {
        (**self).execute(command)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
