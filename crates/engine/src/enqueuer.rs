// SPDX-License-Identifier: MIT

use std::time::Instant;

use jrw_core::{Clock, CommandEnvelope, EventEnvelope, EventKind};
use jrw_rest::resources;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::context::WorkerContext;
use crate::error::EngineError;
use crate::events;
use crate::events::EventSender;

const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(500);

/// Subscribe to `master.broadcast.<api_key>` and dispatch inbound
/// commands: `enqueue` runs get REST-validated and forwarded to the run
/// queue, `kill` requests get REST-validated and forwarded to the kill
/// queue, `ping` PATCHes the worker's liveness fields.
///
/// The bus connection is recycled (dropped and reconnected, with jitter)
/// after an inactivity window with no frames, since a half-open TCP
/// connection to the bus wouldn't otherwise be detected.
pub async fn run_enqueuer<C: Clock>(
    ctx: WorkerContext<C>,
    bus_addr: String,
    run_tx: mpsc::Sender<i64>,
    kill_tx: mpsc::UnboundedSender<i64>,
    events: EventSender,
    shutdown: CancellationToken,
) {
    let topic = format!("master.broadcast.{}", ctx.api_key);

    while !shutdown.is_cancelled() {
        let mut subscriber = match jrw_bus::Subscriber::connect(&bus_addr, topic.clone()).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to connect to bus, retrying");
                jrw_bus::subscriber::reconnect_jitter_sleep().await;
                continue;
            }
        };

        let mut last_activity = Instant::now();

        loop {
            if shutdown.is_cancelled() {
                return;
            }

            match subscriber.recv_timeout(POLL_INTERVAL).await {
                Ok(jrw_bus::Recv::Frame(payload)) => {
                    last_activity = Instant::now();
                    if let Err(e) = handle_command(&ctx, payload, &run_tx, &kill_tx, &events).await {
                        tracing::warn!(error = %e, "failed to handle inbound command");
                    }
                }
                Ok(jrw_bus::Recv::Timeout) => {}
                Ok(jrw_bus::Recv::Closed) => {
                    tracing::info!("bus connection closed, reconnecting");
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "bus read error, reconnecting");
                    break;
                }
            }

            if last_activity.elapsed() > ctx.reconnect_after_inactivity {
                tracing::info!("no bus activity for a while, recycling connection");
                break;
            }
        }

        jrw_bus::subscriber::reconnect_jitter_sleep().await;
    }
}

async fn handle_command<C: Clock>(
    ctx: &WorkerContext<C>,
    payload: serde_json::Value,
    run_tx: &mpsc::Sender<i64>,
    kill_tx: &mpsc::UnboundedSender<i64>,
    events: &EventSender,
) -> Result<(), EngineError> {
    let command: CommandEnvelope = serde_json::from_value(payload)?;

    match command {
        CommandEnvelope::Ping => {
            if let Err(e) = handle_ping(ctx).await {
                tracing::warn!(error = %e, "failed to respond to ping");
            }
        }
        CommandEnvelope::Kill { kill_request_id } => match enqueue_kill(ctx, kill_request_id, events).await {
            Ok(true) => {
                if kill_tx.send(kill_request_id).is_err() {
                    tracing::warn!(kill_request_id, "kill queue closed, dropping kill request");
                }
            }
            Ok(false) => {}
            Err(e) => tracing::warn!(kill_request_id, error = %e, "failed to enqueue kill request"),
        },
        CommandEnvelope::Enqueue { run_id } => match enqueue_run(ctx, run_id, events).await {
            Ok(true) => {
                if run_tx.send(run_id).await.is_err() {
                    tracing::warn!(run_id, "run queue closed, dropping run");
                }
            }
            Ok(false) => {}
            Err(e) => tracing::warn!(run_id, error = %e, "failed to enqueue run"),
        },
    }

    Ok(())
}

/// Look up the single worker record the control plane associates with
/// this api key. Anything other than exactly one result means the
/// dispatch can't be safely attributed to a worker URI, so the caller
/// skips it with a warning rather than guessing.
async fn single_worker<C: Clock>(ctx: &WorkerContext<C>) -> Result<Option<jrw_core::Worker>, EngineError> {
    let mut workers = resources::list_workers(&ctx.rest, &ctx.endpoints.worker_list).await?;
    if workers.len() != 1 {
        tracing::warn!(count = workers.len(), "expected exactly one worker, skipping dispatch");
        return Ok(None);
    }
    Ok(Some(workers.remove(0)))
}

/// Mark `run_id` enqueued and bind it to the claiming worker, unless it
/// already has been. Returns whether the run was newly enqueued (and so
/// should be pushed onto the run queue).
async fn enqueue_run<C: Clock>(
    ctx: &WorkerContext<C>,
    run_id: i64,
    events: &EventSender,
) -> Result<bool, EngineError> {
    let worker = match single_worker(ctx).await? {
        Some(w) => w,
        None => return Ok(false),
    };

    let run_uri = format!("{}{}/", ctx.endpoints.run_list, run_id);
    let run = resources::get_run(&ctx.rest, &run_uri).await?;

    if run.enqueue_dts.is_some() {
        tracing::warn!(run_id, "run already enqueued, ignoring duplicate enqueue command");
        return Ok(false);
    }

    let now = jrw_core::time_fmt::format_dts(ctx.clock.now());
    resources::patch_run(
        &ctx.rest,
        &run_uri,
        json!({ "enqueue_dts": now, "worker": worker.resource_uri }),
    )
    .await?;
    let _ = events.send(EventEnvelope::run(EventKind::Enqueued, run_id));
    Ok(true)
}

/// Mark `kill_request_id` enqueued unless it already has been. Returns
/// whether it was newly enqueued (and so should be pushed onto the kill
/// queue).
async fn enqueue_kill<C: Clock>(
    ctx: &WorkerContext<C>,
    kill_request_id: i64,
    events: &EventSender,
) -> Result<bool, EngineError> {
    let kill_request_uri = format!("{}{}/", ctx.endpoints.kill_request_list, kill_request_id);
    let kill_request = ctx.rest.get::<jrw_core::KillRequest>(&kill_request_uri).await?;

    if kill_request.enqueue_dts.is_some() {
        tracing::warn!(kill_request_id, "kill request already enqueued, ignoring duplicate");
        return Ok(false);
    }

    let now = jrw_core::time_fmt::format_dts(ctx.clock.now());
    resources::patch_kill_request(&ctx.rest, &kill_request_uri, json!({ "enqueue_dts": now })).await?;
    let _ = events.send(EventEnvelope::kill_request(EventKind::Enqueued, kill_request_id));
    Ok(true)
}

async fn handle_ping<C: Clock>(ctx: &WorkerContext<C>) -> Result<(), EngineError> {
    let worker = match single_worker(ctx).await? {
        Some(w) => w,
        None => return Ok(()),
    };

    let now = jrw_core::time_fmt::format_dts(ctx.clock.now());
    resources::patch_worker(
        &ctx.rest,
        &worker.resource_uri,
        json!({
            "ping_response_dts": now,
            "worker_version": ctx.worker_version,
            "concurrent_jobs": ctx.concurrent_jobs,
        }),
    )
    .await
}

#[cfg(test)]
#[path = "enqueuer_tests.rs"]
mod tests;
