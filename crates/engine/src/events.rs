// SPDX-License-Identifier: MIT

use std::sync::Arc;

use jrw_core::EventEnvelope;
use tokio::sync::{mpsc, Mutex as AsyncMutex};

/// FIFO channel events flow through on their way from the executors to
/// the publisher. Unbounded: the worker would rather buffer events in
/// memory than have a slow publisher ever block a run from finishing.
pub type EventSender = mpsc::UnboundedSender<EventEnvelope>;
pub type EventReceiver = mpsc::UnboundedReceiver<EventEnvelope>;

/// The publisher's handle onto [`EventReceiver`], shared behind a mutex
/// so a respawned publisher picks up draining the same queue rather than
/// a fresh empty one.
pub type SharedEventReceiver = Arc<AsyncMutex<EventReceiver>>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

pub fn shared(rx: EventReceiver) -> SharedEventReceiver {
    Arc::new(AsyncMutex::new(rx))
}
