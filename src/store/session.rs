//! Session-scoped file storage backend.
//!
//! One JSON file per key under a directory derived from the current
//! process id, so entries survive for the current session only: a new
//! process gets a fresh directory. No change channels; requesting them
//! upgrades the selection to the local store (see
//! [`effective_kind`](crate::config::effective_kind)).

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use super::{entry_path, StorageBackend, StoreOptions};
use crate::codec::SharedCodec;
use crate::error::StoreResult;
use crate::key::CacheKey;
use crate::record::{decode_record, encode_record};

pub struct SessionStore {
    root: PathBuf,
    ttl: Option<Duration>,
    codec: SharedCodec,
}

fn default_session_root() -> PathBuf {
    std::env::temp_dir().join(format!("restash-session-{}", std::process::id()))
}

impl SessionStore {
    pub fn new(options: &StoreOptions) -> Self {
        Self {
            root: options.root.clone().unwrap_or_else(default_session_root),
            ttl: options.ttl,
            codec: options.codec.clone(),
        }
    }

    pub(crate) fn read_entry(&self, key: &CacheKey) -> StoreResult<Option<Value>> {
        let path = entry_path(&self.root, key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record = decode_record(self.codec.as_ref(), key, &raw)?;
        if record.is_expired(self.ttl, Utc::now()) {
            // Best-effort cleanup; a leftover file just reads as expired again.
            let _ = std::fs::remove_file(&path);
            return Ok(None);
        }
        Ok(Some(record.value))
    }

    pub(crate) fn write_entry(&self, key: &CacheKey, value: &Value) -> StoreResult<()> {
        let encoded = encode_record(self.codec.as_ref(), key, value)?;
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(entry_path(&self.root, key), encoded)?;
        Ok(())
    }

    pub(crate) fn remove_entry(&self, key: &CacheKey) -> StoreResult<()> {
        match std::fs::remove_file(entry_path(&self.root, key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl StorageBackend for SessionStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<Value>> {
        self.read_entry(key)
    }

    async fn set(&self, key: &CacheKey, value: &Value) -> StoreResult<()> {
        self.write_entry(key, value)
    }

    async fn remove(&self, key: &CacheKey) -> StoreResult<()> {
        self.remove_entry(key)
    }
}
