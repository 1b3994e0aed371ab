// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("bus I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed bus frame: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("frame exceeds maximum length ({len} bytes)")]
    FrameTooLarge { len: u32 },

    #[error("not connected to the bus")]
    NotConnected,
}
