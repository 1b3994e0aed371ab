// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("script is missing a shebang line")]
    MissingShebang,

    #[error("script's interpreter line is empty after the shebang")]
    EmptyInterpreter,

    #[error("failed to materialize script: {0}")]
    Materialize(#[source] std::io::Error),

    #[error("failed to spawn process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("spawned process has no observable pid")]
    NoPid,
}
