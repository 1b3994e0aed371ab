// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request to {path} failed with status {status}: {body}")]
    Http { path: String, status: u16, body: String },

    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response was missing expected field {0:?}")]
    MissingField(&'static str),
}
