//! Persistent file storage backend with change channels.
//!
//! Same file-per-key layout as the session store, but rooted at a
//! directory that outlives the process, and every write or removal is
//! announced on the change hub. The channel is scoped to the root
//! directory, so two `LocalStore` instances over the same directory act as
//! separate contexts: one instance's write notifies the other, never
//! itself.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::hub::{channel_name, hub};
use super::{entry_path, StorageBackend, StoreOptions, SyncCallback, SyncCleanup};
use crate::codec::SharedCodec;
use crate::error::StoreResult;
use crate::key::CacheKey;
use crate::record::{decode_record, encode_record};

pub struct LocalStore {
    root: PathBuf,
    ttl: Option<Duration>,
    codec: SharedCodec,
    /// Identity used to filter this instance's own events off the hub.
    instance: Uuid,
}

fn default_local_root() -> PathBuf {
    std::env::temp_dir().join("restash-local")
}

impl LocalStore {
    pub fn new(options: &StoreOptions) -> Self {
        Self {
            root: options.root.clone().unwrap_or_else(default_local_root),
            ttl: options.ttl,
            codec: options.codec.clone(),
            instance: Uuid::now_v7(),
        }
    }

    fn scope(&self) -> String {
        format!("local:{}", self.root.display())
    }
}

#[async_trait]
impl StorageBackend for LocalStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<Value>> {
        let path = entry_path(&self.root, key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record = decode_record(self.codec.as_ref(), key, &raw)?;
        if record.is_expired(self.ttl, Utc::now()) {
            let _ = std::fs::remove_file(&path);
            return Ok(None);
        }
        Ok(Some(record.value))
    }

    async fn set(&self, key: &CacheKey, value: &Value) -> StoreResult<()> {
        let encoded = encode_record(self.codec.as_ref(), key, value)?;
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(entry_path(&self.root, key), encoded)?;
        hub().publish(&channel_name(&self.scope(), key), self.instance, Some(value));
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> StoreResult<()> {
        match std::fs::remove_file(entry_path(&self.root, key)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        hub().publish(&channel_name(&self.scope(), key), self.instance, None);
        Ok(())
    }

    fn subscribe(&self, key: &CacheKey, callback: SyncCallback) -> Option<SyncCleanup> {
        Some(hub().subscribe(channel_name(&self.scope(), key), self.instance, callback))
    }
}
