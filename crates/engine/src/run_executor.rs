// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use jrw_core::{Clock, EventEnvelope, EventKind};
use jrw_rest::{resources, Resolve};
use jrw_shell::{capture_to_completion, materialize_script, spawn, SpawnOutcome};
use parking_lot::Mutex as SyncMutex;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::context::WorkerContext;
use crate::events;
use crate::events::EventSender;
use crate::queues::RunQueue;

const SHEBANG_FAILURE_PREFIX: &str = "[job runner worker] Could not execute job: ";

/// Live pid of every run currently executing, keyed by run id. The kill
/// executor consults this to find what to signal.
pub type PidTable = Arc<SyncMutex<HashMap<i64, i32>>>;

pub fn pid_table() -> PidTable {
    Arc::new(SyncMutex::new(HashMap::new()))
}

/// Run `ctx.concurrent_jobs` worker loops pulling run ids off the shared
/// run queue and executing them to completion.
///
/// Each worker loop is individually supervised: a panic inside one run's
/// execution respawns just that slot, rather than taking down every
/// other run currently in flight.
pub async fn run_pool<C: Clock>(
    ctx: WorkerContext<C>,
    queue: RunQueue,
    events: EventSender,
    shutdown: CancellationToken,
    pids: PidTable,
) {
    let mut handles = Vec::with_capacity(ctx.concurrent_jobs);

    for _ in 0..ctx.concurrent_jobs {
        let ctx = ctx.clone();
        let queue = queue.clone();
        let events = events.clone();
        let shutdown = shutdown.clone();
        let pids = pids.clone();
        handles.push(tokio::spawn(supervise_slot(ctx, queue, events, shutdown, pids)));
    }

    for handle in handles {
        let _ = handle.await;
    }
}

/// Respawn `worker_loop` if it panics, so one bad run doesn't permanently
/// shrink the pool.
async fn supervise_slot<C: Clock>(
    ctx: WorkerContext<C>,
    queue: RunQueue,
    events: EventSender,
    shutdown: CancellationToken,
    pids: PidTable,
) {
    loop {
        let handle = tokio::spawn(worker_loop(
            ctx.clone(),
            queue.clone(),
            events.clone(),
            shutdown.clone(),
            pids.clone(),
        ));
        match handle.await {
            Ok(()) => return,
            Err(join_err) => {
                if shutdown.is_cancelled() {
                    return;
                }
                tracing::error!(error = %join_err, "run executor slot panicked, respawning");
            }
        }
    }
}

async fn worker_loop<C: Clock>(
    ctx: WorkerContext<C>,
    queue: RunQueue,
    events: EventSender,
    shutdown: CancellationToken,
    pids: PidTable,
) {
    loop {
        let run_id = {
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

        execute_run(&ctx, run_id, &events, &pids).await;
    }
}

/// Run a single run to completion: materialize its script, spawn it,
/// capture output, post the log, and emit the `started`/`returned`
/// events in order.
///
/// Any failure in materializing the script or spawning the interpreter
/// still drives the run to a terminal state: "a job not run is a
/// failure" from the control plane's point of view, so it must be
/// visible as a failed `returned` event rather than a silently dropped
/// run. Failure to load the run itself, or to PATCH its terminal state,
/// is logged and abandons the run without a `returned` event; those
/// already exhausted the REST client's own retry budget, so nothing
/// further can be done for this run from here.
async fn execute_run<C: Clock>(ctx: &WorkerContext<C>, run_id: i64, events: &EventSender, pids: &PidTable) {
    let run_uri = format!("{}{}/", ctx.endpoints.run_list, run_id);

    let mut run = match resources::get_run(&ctx.rest, &run_uri).await {
        Ok(run) => run,
        Err(e) => {
            tracing::error!(run_id, error = %e, "failed to load run, abandoning it");
            return;
        }
    };

    let start_now = jrw_core::time_fmt::format_dts(ctx.clock.now());
    if let Err(e) = resources::patch_run(&ctx.rest, &run_uri, json!({ "start_dts": start_now })).await {
        tracing::error!(run_id, error = %e, "failed to patch start_dts, abandoning run");
        return;
    }
    let _ = events.send(EventEnvelope::run(EventKind::Started, run_id));

    let (success, log_content) = run_job(ctx, &mut run, run_id, pids).await;

    let truncated = jrw_core::truncate::truncate_log(log_content.as_bytes(), ctx.log_size_limit);
    let content = String::from_utf8_lossy(&truncated).into_owned();

    // Reload the run rather than trusting the snapshot fetched at the top
    // of this function: a run_log may have been attached to it out of
    // band since the run started, and posting against a stale uri would
    // miss that.
    let run_log = match resources::get_run(&ctx.rest, &run_uri).await {
        Ok(fresh) => fresh.run_log,
        Err(e) => {
            tracing::warn!(run_id, error = %e, "failed to reload run before posting log, using stale snapshot");
            run.run_log.clone()
        }
    };

    let log_result = match run_log {
        Some(run_log_ref) => resources::patch_run_log(&ctx.rest, run_log_ref.resource_uri(), &content).await,
        None => resources::create_run_log(&ctx.rest, &ctx.endpoints.run_log_list, &run_uri, &content)
            .await
            .map(|_| ()),
    };
    if let Err(e) = log_result {
        tracing::error!(run_id, error = %e, "failed to post run log");
    }

    let return_now = jrw_core::time_fmt::format_dts(ctx.clock.now());
    if let Err(e) = resources::patch_run(
        &ctx.rest,
        &run_uri,
        json!({ "return_dts": return_now, "return_success": success }),
    )
    .await
    {
        tracing::error!(run_id, error = %e, "failed to patch return_dts, abandoning run");
        return;
    }
    let _ = events.send(EventEnvelope::run(EventKind::Returned, run_id));
}

/// Materialize the run's script and execute it, PATCHing the observed
/// pid before the pipes are drained so a kill request racing with this
/// run always has a pid to target.
///
/// Returns `(return_success, log_body)`. A job-load, materialize, or
/// spawn failure never propagates as an error: it is folded into a
/// failing log body with the `"[job runner worker] Could not execute
/// job: "` prefix so the caller can still post a terminal state.
async fn run_job<C: Clock>(ctx: &WorkerContext<C>, run: &mut jrw_core::Run, run_id: i64, pids: &PidTable) -> (bool, String) {
    let job = match run.job.resolve(&ctx.rest).await {
        Ok(job) => job.clone(),
        Err(e) => return (false, format!("{SHEBANG_FAILURE_PREFIX}failed to load job: {e}")),
    };

    let materialized = match materialize_script(&job.script_content, &ctx.temp_dir).await {
        Ok(m) => m,
        Err(e) => return (false, format!("{SHEBANG_FAILURE_PREFIX}{e}")),
    };

    let outcome = run_and_capture(ctx, &materialized.interpreter, &materialized.path, run_id, pids).await;

    let _ = tokio::fs::remove_file(&materialized.path).await;

    match outcome {
        Ok(outcome) => (outcome.success, String::from_utf8_lossy(&outcome.output).into_owned()),
        Err(e) => (false, format!("{SHEBANG_FAILURE_PREFIX}{e}")),
    }
}

async fn run_and_capture<C: Clock>(
    ctx: &WorkerContext<C>,
    interpreter: &str,
    script_path: &std::path::Path,
    run_id: i64,
    pids: &PidTable,
) -> Result<SpawnOutcome, jrw_shell::ShellError> {
    let spawned = spawn(interpreter, script_path)?;
    pids.lock().insert(run_id, spawned.pid as i32);

    let run_uri = format!("{}{}/", ctx.endpoints.run_list, run_id);
    if let Err(e) = resources::patch_run(&ctx.rest, &run_uri, json!({ "pid": spawned.pid })).await {
        tracing::warn!(run_id, error = %e, "failed to patch observed pid");
    }

    let result = capture_to_completion(spawned).await;
    pids.lock().remove(&run_id);
    result
}

#[cfg(test)]
#[path = "run_executor_tests.rs"]
mod tests;
