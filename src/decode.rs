//! Parse collaborator: raw payload bytes into a domain value.

use crate::error::Result;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Turns a fetched payload into the value stored for its identifier.
///
/// A decode error is terminal for that identifier; the engine does not retry.
pub trait Decoder: Send + Sync + 'static {
    type Value: Send + 'static;

    fn decode(&self, payload: &[u8]) -> Result<Self::Value>;
}

/// Decodes JSON bodies with serde.
pub struct JsonDecoder<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDecoder<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonDecoder<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for JsonDecoder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonDecoder")
    }
}

impl<T> Decoder for JsonDecoder<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Value = T;

    fn decode(&self, payload: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(payload)?)
    }
}
