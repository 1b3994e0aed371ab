// SPDX-License-Identifier: MIT

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A resource reference that starts life as just a URI and is fetched
/// lazily the first time something asks for its value.
///
/// This mirrors the control plane client's original lazy-attribute-fetch
/// behavior (accessing an unfetched field triggers a `GET`), reshaped for
/// Rust as an explicit `resolve` call instead of hooking attribute access.
/// Once resolved, the value is cached for the lifetime of the `Ref`.
///
/// The actual fetch lives in `jrw-rest` (it needs a `RestClient`), wired
/// in through the `Resolve` extension trait there; this crate only owns
/// the shape and its wire format.
#[derive(Debug, Clone, PartialEq)]
pub enum Ref<T> {
    Uri(String),
    Loaded(T),
}

impl<T> Ref<T> {
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self::Uri(uri.into())
    }

    pub fn from_value(value: T) -> Self {
        Self::Loaded(value)
    }

    /// The URI this reference was constructed from, if it hasn't been
    /// resolved yet.
    pub fn uri(&self) -> Option<&str> {
        match self {
            Ref::Uri(uri) => Some(uri),
            Ref::Loaded(_) => None,
        }
    }

    /// The URI this reference points at, whether or not it has been
    /// resolved: a loaded value reports its own `resource_uri`.
    pub fn resource_uri(&self) -> &str
    where
        T: Resource,
    {
        match self {
            Ref::Uri(uri) => uri,
            Ref::Loaded(value) => value.resource_uri(),
        }
    }
}

/// A model type that knows its own control-plane URI, so a resolved
/// [`Ref`] can still report where it came from.
pub trait Resource {
    fn resource_uri(&self) -> &str;
}

/// The control plane hands out to-one relations as bare URI strings
/// (tastypie-style), so the wire form of an unresolved `Ref` is just the
/// string. A caller that happens to serialize an already-loaded `Ref`
/// (e.g. echoing a fetched model back out) gets its `resource_uri`
/// instead, never the full nested body.
impl<T: Resource> Serialize for Ref<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.resource_uri())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Ref<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(uri) => Ok(Ref::Uri(uri)),
            other => {
                let loaded = T::deserialize(other).map_err(D::Error::custom)?;
                Ok(Ref::Loaded(loaded))
            }
        }
    }
}

#[cfg(test)]
#[path = "reference_tests.rs"]
mod tests;
