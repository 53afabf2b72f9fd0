// src/remote/command.rs

//! Typed remote operations and their POSIX shell rendering.
//!
//! The lifecycle never builds shell strings itself. It describes what it
//! wants as a [`RemoteCommand`]; shell backends render it with
//! [`RemoteCommand::to_shell`], the in-memory backend interprets it directly.

use std::fmt;
use std::path::{Path, PathBuf};

/// An application command run inside a directory on the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    pub cwd: PathBuf,
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment for the command. Values never appear in labels.
    pub env: Vec<(String, String)>,
}

impl ExecRequest {
    pub fn new(cwd: impl Into<PathBuf>, program: impl Into<String>) -> Self {
        Self {
            cwd: cwd.into(),
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// `program arg1 arg2`, without env values.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    /// `mkdir -p`.
    EnsureDir { path: PathBuf },
    /// Prints one of `link`, `dir`, `file`, `missing`.
    PathKind { path: PathBuf },
    ReadFile { path: PathBuf },
    /// Written to a temporary sibling first, then renamed into place. The
    /// sibling starts as a copy of `path`, so an existing file keeps its mode.
    WriteFile { path: PathBuf, contents: String },
    CopyFile { from: PathBuf, to: PathBuf },
    /// `mv -Tf`: atomically replaces `to` (including a symlink) with `from`.
    Rename { from: PathBuf, to: PathBuf },
    /// `ln -sfn`: `link` becomes a symlink whose literal target is `target`.
    Symlink { target: PathBuf, link: PathBuf },
    /// Prints the link target, or nothing if `path` is not a symlink.
    ReadLink { path: PathBuf },
    /// Prints one entry name per line, dotfiles included.
    ListDir { path: PathBuf },
    RemoveFile { path: PathBuf },
    /// `rm -rf` on the path itself; symlinks are not followed.
    RemoveDir { path: PathBuf },
    /// Recursive group rwx plus a default ACL so new files inherit it.
    GrantGroupAccess { path: PathBuf, group: String },
    /// Shallow, quiet clone of a single branch.
    Clone {
        repository: String,
        branch: String,
        dest: PathBuf,
    },
    Exec(ExecRequest),
}

impl RemoteCommand {
    /// Short description safe for logs and error messages.
    pub fn label(&self) -> String {
        match self {
            RemoteCommand::EnsureDir { path } => format!("mkdir -p {}", path.display()),
            RemoteCommand::PathKind { path } => format!("stat {}", path.display()),
            RemoteCommand::ReadFile { path } => format!("cat {}", path.display()),
            RemoteCommand::WriteFile { path, .. } => format!("write {}", path.display()),
            RemoteCommand::CopyFile { from, to } => {
                format!("cp {} {}", from.display(), to.display())
            }
            RemoteCommand::Rename { from, to } => {
                format!("mv {} {}", from.display(), to.display())
            }
            RemoteCommand::Symlink { target, link } => {
                format!("ln -s {} {}", target.display(), link.display())
            }
            RemoteCommand::ReadLink { path } => format!("readlink {}", path.display()),
            RemoteCommand::ListDir { path } => format!("ls {}", path.display()),
            RemoteCommand::RemoveFile { path } => format!("rm {}", path.display()),
            RemoteCommand::RemoveDir { path } => format!("rm -r {}", path.display()),
            RemoteCommand::GrantGroupAccess { path, group } => {
                format!("setfacl g:{group}:rwx {}", path.display())
            }
            RemoteCommand::Clone { branch, dest, .. } => {
                format!("git clone --branch={branch} {}", dest.display())
            }
            RemoteCommand::Exec(req) => req.command_line(),
        }
    }

    /// Data to feed on stdin, if any.
    pub fn stdin(&self) -> Option<&str> {
        match self {
            RemoteCommand::WriteFile { contents, .. } => Some(contents),
            _ => None,
        }
    }

    /// Render as a single POSIX `sh` snippet.
    pub fn to_shell(&self) -> String {
        match self {
            RemoteCommand::EnsureDir { path } => format!("mkdir -p {}", quote_path(path)),
            RemoteCommand::PathKind { path } => {
                let p = quote_path(path);
                format!(
                    "if [ -L {p} ]; then echo link; elif [ -d {p} ]; then echo dir; \
                     elif [ -e {p} ]; then echo file; else echo missing; fi"
                )
            }
            RemoteCommand::ReadFile { path } => format!("cat {}", quote_path(path)),
            RemoteCommand::WriteFile { path, .. } => {
                let tmp = quote_path(&temp_sibling(path));
                let path = quote_path(path);
                format!("cp -p {path} {tmp} 2>/dev/null; cat > {tmp} && mv -f {tmp} {path}")
            }
            RemoteCommand::CopyFile { from, to } => {
                format!("cp -p {} {}", quote_path(from), quote_path(to))
            }
            RemoteCommand::Rename { from, to } => {
                format!("mv -Tf {} {}", quote_path(from), quote_path(to))
            }
            RemoteCommand::Symlink { target, link } => {
                format!("ln -sfn {} {}", quote_path(target), quote_path(link))
            }
            RemoteCommand::ReadLink { path } => {
                let p = quote_path(path);
                format!("if [ -L {p} ]; then readlink {p}; fi")
            }
            RemoteCommand::ListDir { path } => format!("ls -1A {}", quote_path(path)),
            RemoteCommand::RemoveFile { path } => format!("rm -f {}", quote_path(path)),
            RemoteCommand::RemoveDir { path } => format!("rm -rf {}", quote_path(path)),
            RemoteCommand::GrantGroupAccess { path, group } => format!(
                "setfacl -Rm {} {}",
                quote(&format!("g:{group}:rwx,d:g:{group}:rwx")),
                quote_path(path)
            ),
            RemoteCommand::Clone {
                repository,
                branch,
                dest,
            } => format!(
                "git clone {} {} --depth=1 -q {}",
                quote(repository),
                quote(&format!("--branch={branch}")),
                quote_path(dest)
            ),
            RemoteCommand::Exec(req) => {
                let mut line = format!("cd {} &&", quote_path(&req.cwd));
                if !req.env.is_empty() {
                    line.push_str(" env");
                    for (k, v) in &req.env {
                        line.push(' ');
                        line.push_str(&quote(&format!("{k}={v}")));
                    }
                }
                line.push(' ');
                line.push_str(&quote(&req.program));
                for arg in &req.args {
                    line.push(' ');
                    line.push_str(&quote(arg));
                }
                line
            }
        }
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Single-quote `s` for POSIX sh.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

fn quote_path(path: &Path) -> String {
    quote(&path.to_string_lossy())
}

/// Temporary name used while a file is being written.
pub fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".rollout-tmp");
    path.with_file_name(name)
}
