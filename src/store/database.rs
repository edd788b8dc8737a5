//! LMDB-backed storage with a lazily opened, memoized environment.
//!
//! Uses the heed crate (Rust bindings for LMDB). Opening an environment is
//! the backend's "connection handshake": it starts in the background at
//! construction, is memoized per path for the whole process (LMDB forbids
//! opening one environment twice), and [`StorageBackend::is_loading`]
//! reports true until it settles. Writes and removals are announced on the
//! change hub scoped to the environment path, so other instances over the
//! same environment react as separate contexts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions};
use once_cell::sync::Lazy;
use serde_json::Value;
use uuid::Uuid;

use super::hub::{channel_name, hub};
use super::{StorageBackend, StoreOptions, SyncCallback, SyncCleanup};
use crate::codec::SharedCodec;
use crate::error::{StoreError, StoreResult};
use crate::key::CacheKey;
use crate::record::{decode_record, encode_record};

/// Directory name carries the schema version; a format change bumps it.
const DB_DIR: &str = "restash-db-v1";
const DB_MAP_SIZE: usize = 256 * 1024 * 1024;

#[derive(Clone)]
struct DbHandle {
    env: Env,
    db: Database<Str, Str>,
}

/// One environment per path, process-wide.
static ENVIRONMENTS: Lazy<Mutex<HashMap<PathBuf, DbHandle>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn tx_err(e: heed::Error) -> StoreError {
    StoreError::Transaction {
        reason: e.to_string(),
    }
}

fn ensure_env(path: &Path) -> StoreResult<DbHandle> {
    let mut envs = ENVIRONMENTS.lock().map_err(|_| StoreError::LockPoisoned)?;
    if let Some(handle) = envs.get(path) {
        return Ok(handle.clone());
    }

    std::fs::create_dir_all(path)?;
    let env = unsafe {
        EnvOpenOptions::new()
            .map_size(DB_MAP_SIZE)
            .max_dbs(1)
            .open(path)
    }
    .map_err(|e| StoreError::Open {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut wtxn = env.write_txn().map_err(tx_err)?;
    let db: Database<Str, Str> = env
        .create_database(&mut wtxn, None)
        .map_err(|e| StoreError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    wtxn.commit().map_err(tx_err)?;

    let handle = DbHandle { env, db };
    envs.insert(path.to_path_buf(), handle.clone());
    Ok(handle)
}

pub struct DatabaseStore {
    path: PathBuf,
    ttl: Option<Duration>,
    codec: SharedCodec,
    instance: Uuid,
    opening: Arc<AtomicBool>,
}

impl DatabaseStore {
    pub fn new(options: &StoreOptions) -> Self {
        let path = options
            .root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
            .join(DB_DIR);
        let opening = Arc::new(AtomicBool::new(true));

        // Start the handshake in the background so the first operation does
        // not pay for it. Operations still call ensure_env themselves, so a
        // failed warmup is retried rather than fatal.
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let warm_path = path.clone();
                let warm_flag = opening.clone();
                runtime.spawn(async move {
                    if let Err(e) = ensure_env(&warm_path) {
                        tracing::warn!(path = %warm_path.display(), error = %e, "database environment warmup failed");
                    }
                    warm_flag.store(false, Ordering::SeqCst);
                });
            }
            Err(_) => opening.store(false, Ordering::SeqCst),
        }

        Self {
            path,
            ttl: options.ttl,
            codec: options.codec.clone(),
            instance: Uuid::now_v7(),
            opening,
        }
    }

    fn scope(&self) -> String {
        format!("db:{}", self.path.display())
    }

    fn delete_entry(&self, handle: &DbHandle, key: &CacheKey) -> StoreResult<bool> {
        let mut wtxn = handle.env.write_txn().map_err(tx_err)?;
        let deleted = handle.db.delete(&mut wtxn, key.as_str()).map_err(tx_err)?;
        wtxn.commit().map_err(tx_err)?;
        Ok(deleted)
    }
}

#[async_trait]
impl StorageBackend for DatabaseStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<Value>> {
        let handle = ensure_env(&self.path)?;

        let record = {
            let rtxn = handle.env.read_txn().map_err(tx_err)?;
            let Some(raw) = handle.db.get(&rtxn, key.as_str()).map_err(tx_err)? else {
                return Ok(None);
            };
            decode_record(self.codec.as_ref(), key, raw)?
        };

        if record.is_expired(self.ttl, Utc::now()) {
            if let Err(e) = self.delete_entry(&handle, key) {
                tracing::warn!(key = %key, error = %e, "failed to drop expired database entry");
            }
            return Ok(None);
        }
        Ok(Some(record.value))
    }

    async fn set(&self, key: &CacheKey, value: &Value) -> StoreResult<()> {
        let handle = ensure_env(&self.path)?;
        let encoded = encode_record(self.codec.as_ref(), key, value)?;

        let mut wtxn = handle.env.write_txn().map_err(tx_err)?;
        handle
            .db
            .put(&mut wtxn, key.as_str(), &encoded)
            .map_err(tx_err)?;
        wtxn.commit().map_err(tx_err)?;

        hub().publish(&channel_name(&self.scope(), key), self.instance, Some(value));
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> StoreResult<()> {
        let handle = ensure_env(&self.path)?;
        self.delete_entry(&handle, key)?;
        hub().publish(&channel_name(&self.scope(), key), self.instance, None);
        Ok(())
    }

    fn is_loading(&self) -> bool {
        self.opening.load(Ordering::SeqCst)
    }

    fn subscribe(&self, key: &CacheKey, callback: SyncCallback) -> Option<SyncCleanup> {
        Some(hub().subscribe(channel_name(&self.scope(), key), self.instance, callback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> DatabaseStore {
        DatabaseStore::new(&StoreOptions {
            root: Some(dir.path().to_path_buf()),
            ..StoreOptions::default()
        })
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let store = store_in(&dir);
        let key = CacheKey::new("db-round-trip");

        store
            .set(&key, &json!({"rows": [1, 2, 3]}))
            .await
            .expect("set should succeed");
        let loaded = store.get(&key).await.expect("get should succeed");
        assert_eq!(loaded, Some(json!({"rows": [1, 2, 3]})));
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let store = store_in(&dir);
        assert_eq!(
            store
                .get(&CacheKey::new("db-missing"))
                .await
                .expect("get should succeed"),
            None
        );
    }

    #[tokio::test]
    async fn test_entries_span_instances_over_one_environment() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let key = CacheKey::new("db-span");

        store_in(&dir)
            .set(&key, &json!("written"))
            .await
            .expect("set should succeed");

        let second = store_in(&dir);
        assert_eq!(
            second.get(&key).await.expect("get should succeed"),
            Some(json!("written"))
        );
    }

    #[tokio::test]
    async fn test_open_settles() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let store = store_in(&dir);

        // First operation forces the handshake; afterwards the warmup task
        // has had a chance to clear the flag.
        store
            .set(&CacheKey::new("db-open"), &json!(1))
            .await
            .expect("set should succeed");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_expired_entry_reads_absent() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let options = StoreOptions {
            root: Some(dir.path().to_path_buf()),
            ttl: Some(Duration::from_millis(10)),
            ..StoreOptions::default()
        };
        let store = DatabaseStore::new(&options);
        let key = CacheKey::new("db-expired");

        store.set(&key, &json!("soon stale")).await.expect("set should succeed");
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.get(&key).await.expect("get should succeed"), None);
    }

    #[tokio::test]
    async fn test_write_notifies_other_instances() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        let writer = store_in(&dir);
        let reader = store_in(&dir);
        let key = CacheKey::new("db-notify");

        let seen: Arc<Mutex<Vec<Option<Value>>>> = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let cleanup = reader
            .subscribe(
                &key,
                Box::new(move |payload| {
                    if let Ok(mut events) = s.lock() {
                        events.push(payload);
                    }
                }),
            )
            .expect("database store supports change channels");

        writer.set(&key, &json!(7)).await.expect("set should succeed");
        writer.remove(&key).await.expect("remove should succeed");

        let events = seen.lock().expect("lock should not be poisoned");
        assert_eq!(events.as_slice(), &[Some(json!(7)), None]);
        cleanup.cancel();
    }
}
