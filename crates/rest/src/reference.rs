// SPDX-License-Identifier: MIT

use serde::de::DeserializeOwned;

use jrw_core::Ref;

use crate::client::RestClient;
use crate::error::RestError;

/// Fetch-on-first-access for a [`Ref`]. Split out from `jrw-core` because
/// resolving needs a `RestClient`, which `jrw-core` doesn't depend on.
///
/// Mirrors the control plane client's original lazy-attribute-fetch
/// behavior (accessing an unfetched field triggers a `GET`), reshaped for
/// Rust as an explicit call instead of hooking attribute access.
pub trait Resolve {
    type Value;

    /// Resolve to the referenced value, fetching and caching it on first
    /// access.
    async fn resolve(&mut self, client: &RestClient) -> Result<&Self::Value, RestError>;
}

impl<T: DeserializeOwned> Resolve for Ref<T> {
    type Value = T;

    async fn resolve(&mut self, client: &RestClient) -> Result<&T, RestError> {
        if let Ref::Uri(uri) = self {
            let value: T = client.get(uri).await?;
            *self = Ref::Loaded(value);
        }
        match self {
            Ref::Loaded(value) => Ok(value),
            Ref::Uri(_) => unreachable!("just resolved above"),
        }
    }
}

#[cfg(test)]
#[path = "reference_tests.rs"]
mod tests;
