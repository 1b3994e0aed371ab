// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Rest(#[from] jrw_rest::RestError),

    #[error(transparent)]
    Bus(#[from] jrw_bus::BusError),

    #[error(transparent)]
    Shell(#[from] jrw_shell::ShellError),

    #[error("received malformed command envelope: {0}")]
    MalformedCommand(#[from] serde_json::Error),
}
