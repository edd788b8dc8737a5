//! Pluggable value serialization.
//!
//! Backends store an encoded string; the codec decides what that string
//! looks like. The default [`JsonCodec`] round-trips through `serde_json`.
//! Callers with richer needs (cycles, custom type registries) can supply
//! their own implementation.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

/// Error produced by a codec.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct CodecError(pub String);

/// Round-trips structured values to and from their stored string form.
pub trait ValueCodec: Send + Sync + fmt::Debug {
    fn encode(&self, value: &Value) -> Result<String, CodecError>;

    fn decode(&self, raw: &str) -> Result<Value, CodecError>;
}

/// Shared handle to a codec.
pub type SharedCodec = Arc<dyn ValueCodec>;

/// The default codec: plain JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ValueCodec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(|e| CodecError(e.to_string()))
    }

    fn decode(&self, raw: &str) -> Result<Value, CodecError> {
        serde_json::from_str(raw).map_err(|e| CodecError(e.to_string()))
    }
}
