// SPDX-License-Identifier: MIT

use std::time::Duration;

use jrw_bus::Publisher;
use tokio_util::sync::CancellationToken;

use crate::events::SharedEventReceiver;

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const EVENT_TOPIC: &str = "worker.event";

/// Drain `events` and publish each one to the bus under the
/// `worker.event` topic.
///
/// This runs on its own [`CancellationToken`] separate from the rest of
/// the worker's primary shutdown signal, so that a shutdown can stop
/// accepting new work and let in-flight runs finish, and only then
/// signal the publisher to drain whatever events that produced and
/// exit. Polling (rather than blocking on `recv`) matches the original
/// publisher's non-blocking-queue-with-sleep loop.
///
/// `events` is shared behind a mutex rather than owned outright so a
/// respawned publisher (the supervisor restarts this task on panic)
/// resumes draining the same queue instead of losing whatever events
/// were still buffered in the panicking task's receiver.
pub async fn run_publisher(bus_addr: String, events: SharedEventReceiver, shutdown: CancellationToken) {
    let mut publisher = loop {
        match Publisher::connect(&bus_addr).await {
            Ok(p) => break p,
            Err(e) => {
                tracing::warn!(error = %e, "failed to connect publisher to bus, retrying");
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
    };

    loop {
        let next = events.lock().await.try_recv();
        match next {
            Ok(event) => {
                if let Err(e) = publish_event(&mut publisher, &event).await {
                    tracing::warn!(error = %e, "failed to publish event, dropping it");
                }
                continue;
            }
            Err(tokio::sync::mpsc::error::TryRecvError::Empty) => {
                if shutdown.is_cancelled() {
                    return;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            Err(tokio::sync::mpsc::error::TryRecvError::Disconnected) => return,
        }
    }
}

async fn publish_event(publisher: &mut Publisher, event: &jrw_core::EventEnvelope) -> Result<(), jrw_bus::BusError> {
    #[allow(clippy::expect_used)]
    let payload = serde_json::to_value(event).expect("EventEnvelope always serializes");
    publisher.publish(EVENT_TOPIC, payload).await
}

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;
