// SPDX-License-Identifier: MIT

pub mod auth;
pub mod backoff;
pub mod client;
pub mod error;
pub mod reference;
pub mod resources;

pub use client::RestClient;
pub use error::RestError;
pub use reference::Resolve;
