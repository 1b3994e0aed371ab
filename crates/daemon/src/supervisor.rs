// SPDX-License-Identifier: MIT

use std::future::Future;

use jrw_core::Clock;
use jrw_engine::{enqueuer, kill_executor, publisher, queues, run_executor, WorkerContext};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owns the worker's task topology and its two-phase shutdown signal.
///
/// The primary signal is observed by the enqueuer, the run pool, and the
/// kill executor; the secondary signal is observed by the publisher alone,
/// so it keeps draining whatever the primary tasks produced on their way
/// out.
pub struct Supervisor {
    primary: CancellationToken,
    secondary: CancellationToken,
}

impl Supervisor {
    pub fn new() -> Self {
        Self { primary: CancellationToken::new(), secondary: CancellationToken::new() }
    }

    /// Run cleanup, spawn every task, then block until SIGTERM drives a
    /// full two-phase shutdown.
    pub async fn run<C: Clock>(&self, ctx: WorkerContext<C>, broadcaster_addr: String, ws_addr: String, run_list_path: String) {
        if let Err(e) = crate::cleanup::reset_incomplete_runs(&ctx, &run_list_path).await {
            tracing::error!(error = %e, "startup cleanup failed, continuing anyway");
        }

        let (run_tx, run_queue) = queues::run_queue(ctx.concurrent_jobs);
        let (kill_tx, kill_queue) = queues::kill_queue();
        let (event_tx, event_rx) = jrw_engine::events::channel();
        let shared_events = jrw_engine::events::shared(event_rx);
        let pids = run_executor::pid_table();

        let enqueuer_handle = {
            let ctx = ctx.clone();
            let bus_addr = broadcaster_addr.clone();
            let events = event_tx.clone();
            let shutdown = self.primary.clone();
            spawn_supervised("enqueuer", shutdown.clone(), move || {
                let ctx = ctx.clone();
                let bus_addr = bus_addr.clone();
                let run_tx = run_tx.clone();
                let kill_tx = kill_tx.clone();
                let events = events.clone();
                let shutdown = shutdown.clone();
                enqueuer::run_enqueuer(ctx, bus_addr, run_tx, kill_tx, events, shutdown)
            })
        };

        let run_pool_handle = {
            let ctx = ctx.clone();
            let queue = run_queue.clone();
            let events = event_tx.clone();
            let shutdown = self.primary.clone();
            let pids = pids.clone();
            spawn_supervised("run_pool", shutdown.clone(), move || {
                run_executor::run_pool(ctx.clone(), queue.clone(), events.clone(), shutdown.clone(), pids.clone())
            })
        };

        let kill_executor_handle = {
            let ctx = ctx.clone();
            let events = event_tx.clone();
            let shutdown = self.primary.clone();
            spawn_supervised("kill_executor", shutdown.clone(), move || {
                kill_executor::run_kill_executor(ctx.clone(), kill_queue.clone(), events.clone(), shutdown.clone(), pids.clone())
            })
        };

        let publisher_handle = {
            let shutdown = self.secondary.clone();
            spawn_supervised("publisher", shutdown.clone(), move || {
                publisher::run_publisher(ws_addr.clone(), shared_events.clone(), shutdown.clone())
            })
        };

        install_sigterm_handler(self.primary.clone());

        let _ = enqueuer_handle.await;
        let _ = run_pool_handle.await;
        let _ = kill_executor_handle.await;

        self.secondary.cancel();
        let _ = publisher_handle.await;
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn `factory()` under crash recovery: if the resulting task panics
/// and the given shutdown signal has not fired, log the panic and spawn a
/// fresh instance of the same task. A normal (non-panicking) return, or a
/// panic observed after shutdown, ends the supervision loop.
fn spawn_supervised<F, Fut>(name: &'static str, shutdown: CancellationToken, mut factory: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let handle = tokio::spawn(factory());
            match handle.await {
                Ok(()) => return,
                Err(join_err) => {
                    if shutdown.is_cancelled() {
                        return;
                    }
                    tracing::error!(task = name, error = %join_err, "task panicked, respawning");
                }
            }
        }
    })
}

/// Install the SIGTERM handler that drives the primary shutdown signal.
///
/// A single `CancellationToken::cancel()` call wakes every clone's
/// `cancelled()` future at once, so it already has the effect the original
/// semaphore-style "raise the signal `concurrent_jobs + 2` times" scheme
/// achieved by hand: every primary-signal observer sees it on the same
/// tick.
fn install_sigterm_handler(primary: CancellationToken) {
    tokio::spawn(async move {
        let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        term.recv().await;
        tracing::info!("received SIGTERM, beginning graceful shutdown");
        primary.cancel();
    });
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
