// src/remote/mod.rs

//! Remote command execution layer.
//!
//! Every filesystem and process operation on the target host goes through
//! this module.
//!
//! - [`command`] defines the typed operations and their shell rendering.
//! - [`backend`] provides the `RemoteShell` trait with the `SshShell` and
//!   `LocalShell` transports.
//! - [`process`] runs the child processes for those transports.
//! - [`memory`] is an in-memory target used by tests.
//! - [`session`] wraps a shell with typed, status-checked helpers.

pub mod backend;
pub mod command;
pub mod memory;
pub mod process;
pub mod session;

pub use backend::{CommandOutput, LocalShell, RemoteShell, SshShell, shell_for};
pub use command::{ExecRequest, RemoteCommand};
pub use memory::{MemoryFs, MemoryShell, RepositoryFixture};
pub use session::{PathKind, Session};
