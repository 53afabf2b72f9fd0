// src/remote/process.rs

//! Child process runner shared by the shell backends.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::errors::CommandError;

use super::backend::CommandOutput;
use super::command::RemoteCommand;

/// Spawn `cmd`, feed the command's stdin payload, and wait for it.
///
/// stdout is collected in full and must be valid UTF-8; stderr is collected
/// and also logged line by line at debug. There is no timeout: a hung command hangs the run.
pub async fn run_process(
    mut cmd: Command,
    command: &RemoteCommand,
) -> Result<CommandOutput, CommandError> {
    let label = command.label();
    debug!(command = %label, "running remote command");

    let transport = |e: std::io::Error| CommandError::Transport {
        command: label.clone(),
        message: e.to_string(),
    };

    cmd.stdin(if command.stdin().is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(transport)?;

    if let (Some(payload), Some(mut stdin)) = (command.stdin(), child.stdin.take()) {
        stdin
            .write_all(payload.as_bytes())
            .await
            .map_err(transport)?;
        // Close stdin so `cat` sees EOF.
        drop(stdin);
    }

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout {
            out.read_to_end(&mut buf).await?;
        }
        Ok::<_, std::io::Error>(buf)
    });

    let stderr_label = label.clone();
    let stderr_task = tokio::spawn(async move {
        let mut collected = Vec::new();
        if let Some(err) = stderr {
            let mut lines = BufReader::new(err).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(command = %stderr_label, "stderr: {}", line);
                collected.push(line);
            }
        }
        collected.join("\n")
    });

    let status = child.wait().await.map_err(transport)?;
    let stdout = stdout_task
        .await
        .map_err(|e| CommandError::Transport {
            command: label.clone(),
            message: e.to_string(),
        })?
        .map_err(transport)?;
    let stderr = stderr_task.await.unwrap_or_default();

    let code = status.code().unwrap_or(-1);
    debug!(command = %label, exit_code = code, "remote command exited");

    // A lossy or empty read here would look like an empty file to callers.
    let stdout = String::from_utf8(stdout).map_err(|e| CommandError::UnexpectedOutput {
        command: label.clone(),
        output: format!("stdout is not valid UTF-8: {e}"),
    })?;

    Ok(CommandOutput {
        status: code,
        stdout,
        stderr,
    })
}
