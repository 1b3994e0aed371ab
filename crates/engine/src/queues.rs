// SPDX-License-Identifier: MIT

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex as AsyncMutex};

/// Receiving end of the run queue, shared behind a mutex so a crashed
/// consumer task can be respawned against the very same queue instead of
/// losing whatever was left unconsumed.
pub type RunQueue = Arc<AsyncMutex<mpsc::Receiver<i64>>>;
pub type KillQueue = Arc<AsyncMutex<mpsc::UnboundedReceiver<i64>>>;

/// Bounded run queue, capacity `concurrent_jobs` per the original
/// `Queue(concurrent_jobs)` sizing: the enqueuer blocks on `send` once
/// every executor slot already has work queued.
pub fn run_queue(concurrent_jobs: usize) -> (mpsc::Sender<i64>, RunQueue) {
    let (tx, rx) = mpsc::channel(concurrent_jobs.max(1));
    (tx, Arc::new(AsyncMutex::new(rx)))
}

pub fn kill_queue() -> (mpsc::UnboundedSender<i64>, KillQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, Arc::new(AsyncMutex::new(rx)))
}
