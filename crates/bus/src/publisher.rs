// SPDX-License-Identifier: MIT

use tokio::net::TcpStream;

use crate::error::BusError;
use crate::wire::{self, Frame};

/// Client side of the bus's publish stream. Every event the worker emits
/// goes out under a single fixed topic (`worker.event`), mirroring the
/// original transport's single publish socket.
pub struct Publisher {
    stream: TcpStream,
}

impl Publisher {
    pub async fn connect(addr: &str) -> Result<Self, BusError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self { stream })
    }

    pub async fn publish(&mut self, topic: &str, payload: serde_json::Value) -> Result<(), BusError> {
        let frame = Frame::new(topic, payload);
        wire::write_frame(&mut self.stream, &frame).await
    }
}

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;
