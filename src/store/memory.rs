//! In-memory storage backend.
//!
//! Entries live in a process-shared map, so every `MemoryStore` built
//! through the selector sees the same data for the lifetime of the
//! process. TTL and codec are per-instance and applied at read time. No
//! change channels: same-context cells already fan out through the cell
//! registry, and there is nothing durable for another context to observe.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use serde_json::Value;

use super::{StorageBackend, StoreOptions};
use crate::codec::SharedCodec;
use crate::error::{StoreError, StoreResult};
use crate::key::CacheKey;
use crate::record::{decode_record, encode_record};

type EntryMap = Arc<RwLock<HashMap<String, String>>>;

static SHARED: Lazy<EntryMap> = Lazy::new(|| Arc::new(RwLock::new(HashMap::new())));

pub struct MemoryStore {
    entries: EntryMap,
    ttl: Option<Duration>,
    codec: SharedCodec,
}

impl MemoryStore {
    /// Create a store over the process-shared map.
    pub fn new(options: &StoreOptions) -> Self {
        Self {
            entries: SHARED.clone(),
            ttl: options.ttl,
            codec: options.codec.clone(),
        }
    }

    /// Create a store with a private map. Useful in tests that must not
    /// leak state through the shared map.
    pub fn isolated(options: &StoreOptions) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl: options.ttl,
            codec: options.codec.clone(),
        }
    }
}

#[async_trait]
impl StorageBackend for MemoryStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<Value>> {
        let raw = {
            let entries = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
            entries.get(key.as_str()).cloned()
        };
        let Some(raw) = raw else {
            return Ok(None);
        };

        let record = decode_record(self.codec.as_ref(), key, &raw)?;
        if record.is_expired(self.ttl, Utc::now()) {
            if let Ok(mut entries) = self.entries.write() {
                entries.remove(key.as_str());
            }
            return Ok(None);
        }
        Ok(Some(record.value))
    }

    async fn set(&self, key: &CacheKey, value: &Value) -> StoreResult<()> {
        let encoded = encode_record(self.codec.as_ref(), key, value)?;
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        entries.insert(key.to_string(), encoded);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        entries.remove(key.as_str());
        Ok(())
    }
}
