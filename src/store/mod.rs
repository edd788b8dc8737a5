//! Storage backend abstraction and the four concrete variants.
//!
//! All variants share one contract: durably get/set/remove an encoded
//! payload under a string key, report whether the backend's own open
//! handshake is still outstanding, and optionally notify a subscriber when
//! another backend instance writes the same key. Storage failures surface
//! as [`StoreError`] here; the cache cell above treats them as transient
//! and never lets them break the in-memory value.

pub mod database;
pub(crate) mod hub;
pub mod local;
pub mod memory;
pub mod session;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::codec::{JsonCodec, SharedCodec};
use crate::config::StorageKind;
use crate::error::StoreResult;
use crate::key::CacheKey;

pub use database::DatabaseStore;
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use session::SessionStore;

/// Callback invoked when another instance writes (`Some`) or removes
/// (`None`) the subscribed key.
pub type SyncCallback = Box<dyn Fn(Option<Value>) + Send + Sync>;

/// Unsubscribe handle for a change-channel subscription.
///
/// Safe to call any number of times; only the first call has effect.
pub struct SyncCleanup {
    inner: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl SyncCleanup {
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Mutex::new(Some(Box::new(unsubscribe))),
        }
    }

    /// Release the subscription.
    pub fn cancel(&self) {
        if let Ok(mut slot) = self.inner.lock() {
            if let Some(unsubscribe) = slot.take() {
                unsubscribe();
            }
        }
    }
}

impl std::fmt::Debug for SyncCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCleanup").finish_non_exhaustive()
    }
}

/// Pluggable key-value storage with optional change notification.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Load the value stored under `key`, if present and not expired.
    ///
    /// Expired entries read as absent and are removed best-effort.
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<Value>>;

    /// Store `value` under `key`, wrapped with the current write time.
    async fn set(&self, key: &CacheKey, value: &Value) -> StoreResult<()>;

    /// Delete the entry for `key`. Idempotent.
    async fn remove(&self, key: &CacheKey) -> StoreResult<()>;

    /// True only while the backend's own open handshake is outstanding.
    fn is_loading(&self) -> bool {
        false
    }

    /// Subscribe to writes performed through *other* instances of this
    /// backend over the same underlying store. Returns `None` when the
    /// variant has no change-channel support.
    fn subscribe(&self, _key: &CacheKey, _callback: SyncCallback) -> Option<SyncCleanup> {
        None
    }
}

/// Construction options shared by all backend variants.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Root directory for on-disk variants. Defaults to the system temp dir.
    pub root: Option<PathBuf>,
    /// Entry time-to-live. `None` means never expire.
    pub ttl: Option<Duration>,
    /// Codec for stored payloads.
    pub codec: SharedCodec,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            root: None,
            ttl: None,
            codec: Arc::new(JsonCodec),
        }
    }
}

/// Construct the backend for a given kind.
///
/// Pure construction dispatch; on-disk variants open their environments
/// lazily, so construction itself cannot fail.
pub fn select_backend(kind: StorageKind, options: &StoreOptions) -> Arc<dyn StorageBackend> {
    match kind {
        StorageKind::Memory => Arc::new(MemoryStore::new(options)),
        StorageKind::Session => Arc::new(SessionStore::new(options)),
        StorageKind::Local => Arc::new(LocalStore::new(options)),
        StorageKind::Database => Arc::new(DatabaseStore::new(options)),
    }
}

/// File name for a key in the file-backed variants. Keys contain arbitrary
/// serialized arguments, so the name is a hash, not the key itself.
pub(crate) fn entry_path(root: &Path, key: &CacheKey) -> PathBuf {
    let digest = Sha256::digest(key.as_str().as_bytes());
    root.join(format!("{}.json", hex::encode(digest)))
}
