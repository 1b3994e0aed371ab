// SPDX-License-Identifier: MIT

pub mod context;
pub mod enqueuer;
pub mod error;
pub mod events;
pub mod kill_executor;
pub mod publisher;
pub mod queues;
pub mod run_executor;

pub use context::{Endpoints, WorkerContext};
pub use error::EngineError;
pub use queues::{kill_queue, run_queue, KillQueue, RunQueue};
