// SPDX-License-Identifier: MIT

use jrw_core::{Clock, EventEnvelope, EventKind};
use jrw_rest::{resources, Resolve};
use jrw_shell::kill_tree;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::context::WorkerContext;
use crate::error::EngineError;
use crate::events;
use crate::events::EventSender;
use crate::queues::KillQueue;
use crate::run_executor::PidTable;

/// Drain kill requests forwarded by the enqueuer, SIGKILL the
/// corresponding run's process tree if it's still running, and record
/// the outcome on the `KillRequest` resource regardless.
///
/// A kill request for a run that already finished (no entry in
/// `pids`) is not an error: the run and the kill simply raced, and the
/// run's own completion already settled things.
pub async fn run_kill_executor<C: Clock>(
    ctx: WorkerContext<C>,
    queue: KillQueue,
    events: EventSender,
    shutdown: CancellationToken,
    pids: PidTable,
) {
    loop {
        let kill_request_id = {
            let mut guard = queue.lock().await;
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => return,
                next = guard.recv() => match next {
                    Some(id) => id,
                    None => return,
                },
            }
        };

        if let Err(e) = process_kill_request(&ctx, kill_request_id, &events, &pids).await {
            tracing::warn!(kill_request_id, error = %e, "failed to process kill request");
        }
    }
}

async fn process_kill_request<C: Clock>(
    ctx: &WorkerContext<C>,
    kill_request_id: i64,
    events: &EventSender,
    pids: &PidTable,
) -> Result<(), EngineError> {
    let kill_request_uri = format!("{}{}/", ctx.endpoints.kill_request_list, kill_request_id);
    let mut kill_request = ctx.rest.get::<jrw_core::KillRequest>(&kill_request_uri).await?;

    let run = kill_request.run.resolve(&ctx.rest).await?;
    let run_id = run.id;
    // Prefer the locally tracked pid: it's race-safe against a pid the OS
    // has since recycled for an unrelated process. Fall back to the
    // control plane's `run.pid` so a run started by a since-crashed worker
    // incarnation (and so absent from this process's PidTable) can still
    // be killed.
    let pid = pids.lock().get(&run_id).copied().or(run.pid);

    if let Some(pid) = pid {
        kill_tree(pid).await;
    } else {
        tracing::info!(kill_request_id, run_id, "run already finished, nothing to kill");
    }

    let now = jrw_core::time_fmt::format_dts(ctx.clock.now());
    resources::patch_kill_request(&ctx.rest, &kill_request_uri, json!({ "execute_dts": now })).await?;
    let _ = events.send(EventEnvelope::kill_request(EventKind::Executed, kill_request_id));

    Ok(())
}

#[cfg(test)]
#[path = "kill_executor_tests.rs"]
mod tests;
