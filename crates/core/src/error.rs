// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors surfaced by shared primitives (timestamp parsing, truncation
/// invariants). Crate-specific failure modes live in their own error
/// enums (`RestError`, `BusError`, `ShellError`, `EngineError`).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),
}
