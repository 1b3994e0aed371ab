// SPDX-License-Identifier: MIT

use std::time::Duration;

use rand::Rng;
use tokio::net::TcpStream;

use crate::error::BusError;
use crate::wire::{self, Frame};

/// Client side of the bus's pub/sub topic stream.
///
/// Subscribing sends a handshake frame naming the topic prefix this
/// connection wants; the control plane is expected to forward any frame
/// whose topic starts with that prefix. Because prefix matching can in
/// principle forward more than intended, every received frame's topic is
/// re-checked for an exact match before being handed to the caller.
pub struct Subscriber {
    stream: TcpStream,
    topic: String,
}

impl Subscriber {
    /// Connect to `addr` and subscribe to the exact topic `topic`.
    pub async fn connect(addr: &str, topic: impl Into<String>) -> Result<Self, BusError> {
        let mut stream = TcpStream::connect(addr).await?;
        let topic = topic.into();
        let handshake = Frame::new("subscribe", serde_json::json!(topic));
        wire::write_frame(&mut stream, &handshake).await?;
        Ok(Self { stream, topic })
    }

    /// Receive the next frame addressed exactly to this subscriber's
    /// topic, discarding anything else a prefix match let through.
    ///
    /// Returns `Ok(None)` if the connection reached EOF.
    pub async fn recv(&mut self) -> Result<Option<serde_json::Value>, BusError> {
        loop {
            match wire::read_frame(&mut self.stream).await? {
                None => return Ok(None),
                Some(frame) if frame.topic == self.topic => return Ok(Some(frame.payload)),
                Some(_other) => continue,
            }
        }
    }

    /// Receive the next frame within `timeout`, distinguishing "nothing
    /// arrived in time" from "the connection is closed" so a caller
    /// polling in a loop can tell a quiet bus apart from a dead one.
    /// Used to drive the non-blocking poll loop in the enqueuer without
    /// pinning a whole task to a blocking read.
    pub async fn recv_timeout(&mut self, timeout: Duration) -> Result<Recv, BusError> {
        match tokio::time::timeout(timeout, self.recv()).await {
            Ok(Ok(Some(payload))) => Ok(Recv::Frame(payload)),
            Ok(Ok(None)) => Ok(Recv::Closed),
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => Ok(Recv::Timeout),
        }
    }
}

/// Outcome of a single [`Subscriber::recv_timeout`] poll.
#[derive(Debug)]
pub enum Recv {
    /// A frame addressed to this subscriber's topic arrived.
    Frame(serde_json::Value),
    /// Nothing arrived before the timeout elapsed; the connection is
    /// still open.
    Timeout,
    /// The connection reached EOF.
    Closed,
}

/// Sleep a random 1-10s jitter before reconnecting after an inactivity
/// window, so a bus-side restart doesn't get hammered by every worker
/// reconnecting in lockstep.
pub async fn reconnect_jitter_sleep() {
    let secs = rand::rng().random_range(1..=10);
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

#[cfg(test)]
#[path = "subscriber_tests.rs"]
mod tests;
