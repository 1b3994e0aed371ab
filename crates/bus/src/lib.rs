// SPDX-License-Identifier: MIT

pub mod error;
pub mod publisher;
pub mod subscriber;
pub mod wire;

pub use error::BusError;
pub use publisher::Publisher;
pub use subscriber::{Recv, Subscriber};
pub use wire::Frame;
