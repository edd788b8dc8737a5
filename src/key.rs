//! Cache key derivation.
//!
//! A [`CacheKey`] uniquely identifies one cached value. Keys are composed
//! from a logical call name plus a canonical rendering of the call argument,
//! so two calls with structurally equal arguments always map to the same
//! key, regardless of map insertion order.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::ConfigError;

/// A string key identifying one cached value.
///
/// Composite keys take the form `<name>-<argument>`; when namespacing is
/// requested the key becomes `<base>:<suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wrap a raw key string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Compose a key from a logical call name and a serialized argument.
    pub fn compose(name: &str, argument_key: &str) -> Self {
        Self(format!("{name}-{argument_key}"))
    }

    /// Derive a namespaced variant of this key (`<base>:<suffix>`).
    pub fn with_namespace(&self, suffix: &str) -> Self {
        Self(format!("{}:{}", self.0, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Rebuild a JSON value with object keys in sorted order, recursively.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = serde_json::Map::new();
            for (k, v) in entries {
                out.insert(k.clone(), canonicalize(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Render a JSON value as a canonical string with sorted object keys.
///
/// Structurally equal values produce byte-identical output.
pub fn canonical_json(value: &Value) -> String {
    // Serializing a Value with string keys cannot fail.
    serde_json::to_string(&canonicalize(value)).unwrap_or_default()
}

/// Derive the argument portion of a composite key.
///
/// `None` (no argument) renders as `null`, giving anonymous calls a stable
/// key. Arguments that cannot be serialized are a configuration error.
pub fn argument_key<A: Serialize>(argument: Option<&A>) -> Result<String, ConfigError> {
    match argument {
        None => Ok("null".to_string()),
        Some(arg) => {
            let value = serde_json::to_value(arg).map_err(|e| ConfigError::InvalidValue {
                field: "argument".to_string(),
                reason: e.to_string(),
            })?;
            Ok(canonical_json(&value))
        }
    }
}
