//! Stored record framing and expiry.
//!
//! Every persisted value is wrapped as `{ value, timestamp }` where the
//! timestamp is the wall-clock write time in milliseconds. Payloads written
//! by older formats (a bare value with no wrapper) are accepted on read and
//! treated as present and unexpired.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::ValueCodec;
use crate::error::{StoreError, StoreResult};
use crate::key::CacheKey;

/// A value together with its wall-clock write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub value: Value,
    /// Write time, milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl StoredRecord {
    /// Wrap a value with the current wall-clock time.
    pub fn now(value: Value) -> Self {
        Self {
            value,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Interpret a decoded payload as a record.
    ///
    /// Anything that is not a `{ value, timestamp }` wrapper is a legacy
    /// raw value and gets stamped with the current time so it reads as
    /// unexpired.
    pub fn parse(payload: Value) -> Self {
        if let Value::Object(map) = &payload {
            if map.len() == 2 {
                if let (Some(value), Some(Value::Number(ts))) =
                    (map.get("value"), map.get("timestamp"))
                {
                    if let Some(timestamp) = ts.as_i64() {
                        return Self {
                            value: value.clone(),
                            timestamp,
                        };
                    }
                }
            }
        }
        Self::now(payload)
    }

    /// A record is expired iff strictly more than `ttl` has elapsed since
    /// it was written. `None` means never expire.
    pub fn is_expired(&self, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
        match ttl {
            None => false,
            Some(ttl) => {
                let age_ms = now.timestamp_millis().saturating_sub(self.timestamp);
                age_ms > ttl.as_millis() as i64
            }
        }
    }

    /// The wrapper form written to storage.
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "value": self.value, "timestamp": self.timestamp })
    }
}

/// Wrap `value` with the current time and encode it for storage.
pub(crate) fn encode_record(
    codec: &dyn ValueCodec,
    key: &CacheKey,
    value: &Value,
) -> StoreResult<String> {
    let record = StoredRecord::now(value.clone());
    codec
        .encode(&record.to_value())
        .map_err(|e| StoreError::Encode {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

/// Decode a stored payload into a record, accepting the legacy raw form.
pub(crate) fn decode_record(
    codec: &dyn ValueCodec,
    key: &CacheKey,
    raw: &str,
) -> StoreResult<StoredRecord> {
    let payload = codec.decode(raw).map_err(|e| StoreError::Decode {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    Ok(StoredRecord::parse(payload))
}
