// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// A command broadcast on the `master.broadcast.<api_key>` bus topic.
///
/// `Ping` is accepted but otherwise ignored by the enqueuer; it exists so
/// the control plane can probe liveness without a dedicated topic.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CommandEnvelope {
    Enqueue { run_id: i64 },
    Kill { kill_request_id: i64 },
    Ping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Enqueued,
    Started,
    Returned,
    Executed,
}

/// Event published on the `worker.event` bus topic after a run or kill
/// request changes state.
///
/// Internally tagged on `kind` so the wire shape matches the control
/// plane's own two payload shapes exactly: `{"kind":"run","event":"...",
/// "run_id":<int>}` or `{"kind":"kill_request","event":"...",
/// "kill_request_id":<int>}`. The subject id's field name, not just its
/// value, depends on which kind of event this is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventEnvelope {
    Run { event: EventKind, run_id: i64 },
    KillRequest { event: EventKind, kill_request_id: i64 },
}

impl EventEnvelope {
    pub fn run(event: EventKind, run_id: i64) -> Self {
        Self::Run { event, run_id }
    }

    pub fn kill_request(event: EventKind, kill_request_id: i64) -> Self {
        Self::KillRequest { event, kill_request_id }
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
