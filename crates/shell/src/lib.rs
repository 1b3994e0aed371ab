// SPDX-License-Identifier: MIT

pub mod error;
pub mod killtree;
pub mod materialize;
pub mod spawn;

pub use error::ShellError;
pub use killtree::kill_tree;
pub use materialize::materialize_script;
pub use spawn::{capture_to_completion, spawn, spawn_and_capture, SpawnOutcome, SpawnedChild};
