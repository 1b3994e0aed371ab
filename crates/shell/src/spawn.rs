// SPDX-License-Identifier: MIT

use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

use crate::error::ShellError;

/// Result of running a materialized script to completion.
pub struct SpawnOutcome {
    pub pid: u32,
    /// Combined stdout+stderr, interleaved in arrival order.
    pub output: Vec<u8>,
    pub success: bool,
}

/// A freshly spawned child, pid already observed.
///
/// Split out from capturing its output so a caller can record the pid
/// (e.g. PATCH it to the control plane) before it starts waiting on the
/// child: a kill request racing the run's completion always needs a
/// valid pid to target.
pub struct SpawnedChild {
    pub pid: u32,
    child: Child,
}

/// Tokenize `interpreter` (e.g. `"/usr/bin/env bash"`) and exec it against
/// `script_path`, returning as soon as the pid is observable.
pub fn spawn(interpreter: &str, script_path: &Path) -> Result<SpawnedChild, ShellError> {
    let mut tokens = interpreter.split_whitespace();
    let program = tokens.next().ok_or(ShellError::EmptyInterpreter)?;

    let mut command = Command::new(program);
    command.args(tokens);
    command.arg(script_path);
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let mut child = command.spawn().map_err(ShellError::Spawn)?;
    let pid = child.id().ok_or(ShellError::NoPid)?;

    Ok(SpawnedChild { pid, child })
}

/// Drain the child's merged stdout/stderr to EOF and wait for it to
/// terminate. The two pipes are read concurrently so a script that fills
/// one pipe's buffer without touching the other never deadlocks.
pub async fn capture_to_completion(spawned: SpawnedChild) -> Result<SpawnOutcome, ShellError> {
    let SpawnedChild { pid, mut child } = spawned;

    #[allow(clippy::expect_used)]
    let mut stdout = child.stdout.take().expect("stdout was piped");
    #[allow(clippy::expect_used)]
    let mut stderr = child.stderr.take().expect("stderr was piped");

    let mut output = Vec::new();
    let mut out_chunk = [0u8; 8192];
    let mut err_chunk = [0u8; 8192];
    let mut out_done = false;
    let mut err_done = false;

    while !out_done || !err_done {
        tokio::select! {
            result = stdout.read(&mut out_chunk), if !out_done => {
                match result {
                    Ok(0) | Err(_) => out_done = true,
                    Ok(n) => output.extend_from_slice(&out_chunk[..n]),
                }
            }
            result = stderr.read(&mut err_chunk), if !err_done => {
                match result {
                    Ok(0) | Err(_) => err_done = true,
                    Ok(n) => output.extend_from_slice(&err_chunk[..n]),
                }
            }
        }
    }

    let status = child.wait().await.map_err(ShellError::Spawn)?;

    Ok(SpawnOutcome { pid, output, success: status.success() })
}

/// Convenience wrapper for callers that don't need the pid before the
/// process finishes (most tests).
pub async fn spawn_and_capture(interpreter: &str, script_path: &Path) -> Result<SpawnOutcome, ShellError> {
    let spawned = spawn(interpreter, script_path)?;
    capture_to_completion(spawned).await
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
