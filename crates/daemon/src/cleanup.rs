// SPDX-License-Identifier: MIT

use jrw_core::{Clock, RunState};
use jrw_rest::resources;
use serde_json::json;

use jrw_engine::WorkerContext;

use crate::error::LifecycleError;

/// Reset every run this worker abandoned mid-flight on its last exit.
///
/// A run stuck in `in_queue` or `started` means a previous worker process
/// died before reaching a terminal state for it. PATCHing its
/// `enqueue_dts`/`start_dts` back to null returns it to `scheduled` so the
/// control plane can redispatch it, rather than leaving it invisible to
/// every other worker forever.
pub async fn reset_incomplete_runs<C: Clock>(ctx: &WorkerContext<C>, run_list_path: &str) -> Result<usize, LifecycleError> {
    let mut reset = 0;

    for state in [RunState::InQueue, RunState::Started] {
        let stuck = resources::list_runs_in_state(&ctx.rest, run_list_path, state, &ctx.api_key).await?;
        for run in stuck {
            resources::patch_run(&ctx.rest, &run.resource_uri, json!({ "enqueue_dts": null, "start_dts": null })).await?;
            reset += 1;
        }
    }

    if reset > 0 {
        tracing::info!(count = reset, "reset incomplete runs from a previous worker lifetime");
    }

    Ok(reset)
}

#[cfg(test)]
#[path = "cleanup_tests.rs"]
mod tests;
