// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::BusError;

/// Maximum frame payload size, guarding against a runaway length prefix
/// turning a corrupt stream into an unbounded allocation.
const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// A single bus message: a topic string and a JSON payload, the wire-level
/// stand-in for the original pub/sub transport's multipart
/// `[topic, payload]` messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub topic: String,
    pub payload: Value,
}

impl Frame {
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self { topic: topic.into(), payload }
    }
}

/// Serialize a frame to its JSON body, with no length prefix.
pub fn encode(frame: &Frame) -> Result<Vec<u8>, BusError> {
    Ok(serde_json::to_vec(&(&frame.topic, &frame.payload))?)
}

/// Deserialize a frame from its JSON body.
pub fn decode(bytes: &[u8]) -> Result<Frame, BusError> {
    let (topic, payload): (String, Value) = serde_json::from_slice(bytes)?;
    Ok(Frame { topic, payload })
}

/// Write a frame to `writer` as a 4-byte big-endian length prefix
/// followed by its JSON body.
pub async fn write_frame<W: AsyncWriteExt + Unpin>(writer: &mut W, frame: &Frame) -> Result<(), BusError> {
    let body = encode(frame)?;
    let len: u32 = body
        .len()
        .try_into()
        .map_err(|_| BusError::FrameTooLarge { len: u32::MAX })?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame from `reader`. Returns `Ok(None)` on a
/// clean EOF before any bytes of the next frame arrive.
pub async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Option<Frame>, BusError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(BusError::FrameTooLarge { len });
    }
    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;
    Ok(Some(decode(&body)?))
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
