// SPDX-License-Identifier: MIT

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::process::Command;

/// Kill `pid` and every descendant of it, children first.
///
/// Descendants are discovered by shelling out to `ps`, since the
/// children spawned by an arbitrary shell script aren't tracked anywhere
/// in-process. A process that's already gone by the time we get to it
/// (`ESRCH`) is not an error: the race between a run finishing and a
/// kill request landing is expected, not exceptional.
pub async fn kill_tree(pid: i32) {
    for child in children_of(pid).await {
        Box::pin(kill_tree(child)).await;
    }

    match signal::kill(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) => tracing::debug!(pid, "sent SIGKILL"),
        Err(Errno::ESRCH) => tracing::debug!(pid, "process already gone"),
        Err(e) => tracing::warn!(pid, error = %e, "failed to signal process"),
    }
}

async fn children_of(pid: i32) -> Vec<i32> {
    let output = Command::new("ps")
        .args(["-o", "pid", "--ppid", &pid.to_string(), "--noheaders"])
        .output()
        .await;

    match output {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout)
            .lines()
            .filter_map(|line| line.trim().parse::<i32>().ok())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
#[path = "killtree_tests.rs"]
mod tests;
