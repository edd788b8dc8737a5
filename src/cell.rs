//! The persisted cache cell.
//!
//! A [`PersistedCell`] owns one keyed value and mediates between three
//! writers: the in-process caller, sibling cells bound to the same key in
//! this context, and other contexts announcing writes through the
//! backend's change channel. Reads and writes are synchronous; persistence
//! is fire-and-forget and loading is asynchronous, so the cell always has
//! a usable value (the initial value until something better arrives).
//!
//! Storage failures never escape the cell: a failed load or persist is
//! logged and the in-memory value keeps working.

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::key::CacheKey;
use crate::registry::{registry, RegisteredCell};
use crate::store::{StorageBackend, SyncCleanup};

/// Values a cell can hold. Blanket-implemented.
pub trait CacheValue:
    Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> CacheValue for T where
    T: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

struct CellState<T> {
    key: CacheKey,
    current: Option<T>,
    initial: Option<T>,
    /// Reentrancy guard: set while a value is being adopted from storage,
    /// a sibling, or another context, so the adoption cannot re-trigger
    /// persistence or fan-out.
    updating: bool,
    /// Bumped on every rekey; async loads tagged with an older generation
    /// are discarded when they land.
    generation: u64,
    /// Set when the current value was retained across a rekey. A
    /// provisional value is visible but does not count as data for the
    /// current key until a load, write, or adoption settles it.
    provisional: bool,
    sync_cleanup: Option<SyncCleanup>,
    destroyed: bool,
}

struct CellInner<T> {
    id: Uuid,
    backend: Arc<dyn StorageBackend>,
    debug: bool,
    state: Mutex<CellState<T>>,
}

/// A reactive, storage-backed container for one keyed value.
pub struct PersistedCell<T: CacheValue> {
    inner: Arc<CellInner<T>>,
}

impl<T: CacheValue> RegisteredCell for CellInner<T> {
    fn adopt(&self, payload: Option<&Value>) {
        let Ok(mut st) = self.state.lock() else {
            return;
        };
        if st.destroyed {
            return;
        }
        st.updating = true;
        match payload {
            None => {
                st.current = None;
                st.provisional = false;
                if self.debug {
                    tracing::debug!(key = %st.key, "sibling cleared value");
                }
            }
            Some(value) => match serde_json::from_value::<T>(value.clone()) {
                Ok(value) => {
                    st.current = Some(value);
                    st.provisional = false;
                    if self.debug {
                        tracing::debug!(key = %st.key, "sibling value adopted");
                    }
                }
                Err(e) => {
                    tracing::warn!(key = %st.key, error = %e, "sibling value does not deserialize; keeping current value");
                }
            },
        }
        st.updating = false;
    }
}

impl<T: CacheValue> CellInner<T> {
    /// A write arrived from another context over the change channel.
    fn on_remote_change(&self, payload: Option<Value>) {
        // Removals and expiries (None) leave the in-memory value alone.
        let Some(value) = payload else {
            return;
        };
        let (key, adopted) = {
            let Ok(mut st) = self.state.lock() else {
                return;
            };
            if st.destroyed || st.updating {
                return;
            }
            st.updating = true;
            let adopted = match serde_json::from_value::<T>(value.clone()) {
                Ok(decoded) => {
                    st.current = Some(decoded);
                    st.provisional = false;
                    if self.debug {
                        tracing::debug!(key = %st.key, "remote value adopted");
                    }
                    true
                }
                Err(e) => {
                    tracing::warn!(key = %st.key, error = %e, "remote value does not deserialize; keeping current value");
                    false
                }
            };
            st.updating = false;
            (st.key.clone(), adopted)
        };
        // Bridge the other context's write to this context's siblings.
        if adopted {
            registry().broadcast(&key, self.id, Some(&value));
        }
    }

    /// The async load for `generation` finished with a persisted value.
    fn finish_load(&self, generation: u64, value: Value) {
        let Ok(mut st) = self.state.lock() else {
            return;
        };
        if st.destroyed || st.generation != generation {
            return;
        }
        st.updating = true;
        match serde_json::from_value::<T>(value) {
            Ok(decoded) => {
                st.current = Some(decoded);
                st.provisional = false;
                if self.debug {
                    tracing::debug!(key = %st.key, "persisted value adopted");
                }
            }
            Err(e) => {
                tracing::warn!(key = %st.key, error = %e, "persisted value does not deserialize; keeping current value");
            }
        }
        st.updating = false;
    }

    fn destroy(self: &Arc<Self>) {
        let (key, cleanup) = {
            let Ok(mut st) = self.state.lock() else {
                return;
            };
            if st.destroyed {
                return;
            }
            st.destroyed = true;
            (st.key.clone(), st.sync_cleanup.take())
        };
        if let Some(cleanup) = cleanup {
            cleanup.cancel();
        }
        registry().unregister(&key, self.id);
        if self.debug {
            tracing::debug!(key = %key, "cell destroyed");
        }
    }
}

impl<T: CacheValue> PersistedCell<T> {
    /// Create a cell bound to `key`.
    ///
    /// The cell is readable immediately: `current` starts at `initial` and
    /// is replaced in the background if a persisted value exists.
    pub fn new(key: CacheKey, initial: Option<T>, backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_debug(key, initial, backend, false)
    }

    /// Like [`PersistedCell::new`], with per-key lifecycle logging at debug
    /// level when `debug` is set.
    pub fn with_debug(
        key: CacheKey,
        initial: Option<T>,
        backend: Arc<dyn StorageBackend>,
        debug: bool,
    ) -> Self {
        let inner = Arc::new(CellInner {
            id: Uuid::now_v7(),
            backend,
            debug,
            state: Mutex::new(CellState {
                key: key.clone(),
                current: initial.clone(),
                initial,
                updating: false,
                generation: 0,
                provisional: false,
                sync_cleanup: None,
                destroyed: false,
            }),
        });
        let cell = Self { inner };
        cell.attach(&key);
        if debug {
            tracing::debug!(key = %key, "cell constructed");
        }
        cell
    }

    /// Register with the same-context registry, subscribe to the change
    /// channel, and start the async load for the current key.
    fn attach(&self, key: &CacheKey) {
        let as_dyn: Arc<dyn RegisteredCell> = self.inner.clone();
        registry().register(key, self.inner.id, Arc::downgrade(&as_dyn));

        let weak = Arc::downgrade(&self.inner);
        let cleanup = self.inner.backend.subscribe(
            key,
            Box::new(move |payload| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_remote_change(payload);
                }
            }),
        );
        if let Ok(mut st) = self.inner.state.lock() {
            st.sync_cleanup = cleanup;
        }

        self.spawn_load();
    }

    fn spawn_load(&self) {
        let (key, generation) = {
            let Ok(st) = self.inner.state.lock() else {
                return;
            };
            (st.key.clone(), st.generation)
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(key = %key, "no async runtime; skipping persisted load");
            return;
        };
        let backend = self.inner.backend.clone();
        let weak = Arc::downgrade(&self.inner);
        runtime.spawn(async move {
            match backend.get(&key).await {
                Ok(Some(value)) => {
                    if let Some(inner) = weak.upgrade() {
                        inner.finish_load(generation, value);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "persisted load failed; keeping in-memory value");
                }
            }
        });
    }

    /// The current key.
    pub fn key(&self) -> CacheKey {
        self.inner
            .state
            .lock()
            .map(|st| st.key.clone())
            .unwrap_or_else(|_| CacheKey::new(""))
    }

    /// The current value. Always synchronous; never blocks on storage.
    pub fn get(&self) -> Option<T> {
        self.inner
            .state
            .lock()
            .ok()
            .and_then(|st| st.current.clone())
    }

    /// True while the backend's own open handshake is outstanding. A key
    /// whose value simply has not loaded yet reads as the initial value
    /// instead.
    pub fn is_loading(&self) -> bool {
        self.inner.backend.is_loading()
    }

    /// True while the current value was retained across a rekey and nothing
    /// has confirmed it for the current key yet. Consumers deciding whether
    /// a cache hit exists should treat a provisional value as a miss.
    pub fn is_provisional(&self) -> bool {
        self.inner
            .state
            .lock()
            .map(|st| st.provisional)
            .unwrap_or(false)
    }

    /// Write a value.
    ///
    /// Writes that leave the value structurally unchanged update the
    /// stored instance but neither persist nor fan out. Absent (`None`) is
    /// never persisted, so the last durable value survives a transient
    /// "no data" state.
    pub fn set(&self, value: Option<T>) {
        let (key, payload) = {
            let Ok(mut st) = self.inner.state.lock() else {
                return;
            };
            if st.destroyed {
                st.current = value;
                return;
            }
            let changed = st.current != value;
            let internal = st.updating;
            st.current = value.clone();
            if !internal {
                st.provisional = false;
            }
            if !changed || internal {
                return;
            }
            if self.inner.debug {
                tracing::debug!(key = %st.key, "value written");
            }
            let Some(value) = value else {
                return;
            };
            let payload = match serde_json::to_value(&value) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(key = %st.key, error = %e, "value does not serialize; kept in memory only");
                    return;
                }
            };
            (st.key.clone(), payload)
        };

        self.persist(&key, payload.clone());
        registry().broadcast(&key, self.inner.id, Some(&payload));
    }

    fn persist(&self, key: &CacheKey, payload: Value) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(key = %key, "no async runtime; value not persisted");
            return;
        };
        let backend = self.inner.backend.clone();
        let key = key.clone();
        runtime.spawn(async move {
            if let Err(e) = backend.set(&key, &payload).await {
                tracing::warn!(key = %key, error = %e, "failed to persist value");
            }
        });
    }

    /// Re-bind the cell to a new key without destroying it.
    ///
    /// `initial` replaces the fallback value when given. With `retain` the
    /// current value stays visible while the new key's persisted value
    /// loads; otherwise the cell resets to the initial value. Whatever the
    /// cell shows after the switch is shared with the new key's siblings.
    pub fn rekey(&self, key: CacheKey, initial: Option<Option<T>>, retain: bool) {
        let (old_key, payload) = {
            let Ok(mut st) = self.inner.state.lock() else {
                return;
            };
            if st.destroyed {
                return;
            }
            let old_key = st.key.clone();
            if let Some(cleanup) = st.sync_cleanup.take() {
                cleanup.cancel();
            }
            st.key = key.clone();
            if let Some(initial) = initial {
                st.initial = initial;
            }
            if retain {
                // Carried over from the old key; the new key has not
                // confirmed it yet.
                st.provisional = st.current.is_some();
            } else {
                st.current = st.initial.clone();
                st.provisional = false;
            }
            st.generation += 1;
            if self.inner.debug {
                tracing::debug!(old_key = %old_key, new_key = %st.key, retain, "cell re-keyed");
            }
            let payload = st
                .current
                .as_ref()
                .and_then(|v| serde_json::to_value(v).ok());
            (old_key, payload)
        };

        registry().unregister(&old_key, self.inner.id);
        self.attach(&key);
        if let Some(payload) = payload {
            registry().broadcast(&key, self.inner.id, Some(&payload));
        }
    }

    /// Drop back to the initial value and remove the persisted record.
    pub async fn reset(&self) {
        let (key, payload) = {
            let Ok(mut st) = self.inner.state.lock() else {
                return;
            };
            if st.destroyed {
                return;
            }
            st.current = st.initial.clone();
            st.provisional = false;
            let payload = st
                .initial
                .as_ref()
                .and_then(|v| serde_json::to_value(v).ok());
            if self.inner.debug {
                tracing::debug!(key = %st.key, "cell reset to initial value");
            }
            (st.key.clone(), payload)
        };

        registry().broadcast(&key, self.inner.id, payload.as_ref());
        if let Err(e) = self.inner.backend.remove(&key).await {
            tracing::warn!(key = %key, error = %e, "failed to remove persisted record");
        }
    }

    /// Release the registry entry and the change-channel subscription.
    /// Idempotent; also runs on drop.
    pub fn destroy(&self) {
        self.inner.destroy();
    }
}

impl<T: CacheValue> Drop for PersistedCell<T> {
    fn drop(&mut self) {
        self.inner.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreOptions, SyncCallback};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Memory-backed test double that counts writes and exposes the
    /// captured change-channel callback for manual triggering.
    struct ProbeBackend {
        store: MemoryStore,
        set_calls: AtomicUsize,
        callback: Mutex<Option<SyncCallback>>,
        cleanup_calls: Arc<AtomicUsize>,
        slow_get: Option<Duration>,
    }

    impl ProbeBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                store: MemoryStore::isolated(&StoreOptions::default()),
                set_calls: AtomicUsize::new(0),
                callback: Mutex::new(None),
                cleanup_calls: Arc::new(AtomicUsize::new(0)),
                slow_get: None,
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                store: MemoryStore::isolated(&StoreOptions::default()),
                set_calls: AtomicUsize::new(0),
                callback: Mutex::new(None),
                cleanup_calls: Arc::new(AtomicUsize::new(0)),
                slow_get: Some(delay),
            })
        }

        async fn seed(&self, key: &CacheKey, value: Value) {
            self.store
                .set(key, &value)
                .await
                .expect("seed should succeed");
        }

        fn fire(&self, payload: Option<Value>) {
            let callback = self.callback.lock().expect("lock should not be poisoned");
            if let Some(callback) = callback.as_ref() {
                callback(payload);
            }
        }
    }

    #[async_trait]
    impl StorageBackend for ProbeBackend {
        async fn get(&self, key: &CacheKey) -> crate::error::StoreResult<Option<Value>> {
            if let Some(delay) = self.slow_get {
                tokio::time::sleep(delay).await;
            }
            self.store.get(key).await
        }

        async fn set(&self, key: &CacheKey, value: &Value) -> crate::error::StoreResult<()> {
            self.set_calls.fetch_add(1, Ordering::SeqCst);
            self.store.set(key, value).await
        }

        async fn remove(&self, key: &CacheKey) -> crate::error::StoreResult<()> {
            self.store.remove(key).await
        }

        fn subscribe(&self, _key: &CacheKey, callback: SyncCallback) -> Option<SyncCleanup> {
            if let Ok(mut slot) = self.callback.lock() {
                *slot = Some(callback);
            }
            let count = self.cleanup_calls.clone();
            Some(SyncCleanup::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            }))
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test]
    async fn test_initial_value_is_synchronous() {
        let backend = ProbeBackend::new();
        let cell = PersistedCell::new(
            CacheKey::new("cell-initial"),
            Some("init".to_string()),
            backend.clone(),
        );
        // Readable before any async resolution.
        assert_eq!(cell.get(), Some("init".to_string()));

        settle().await;
        // Backend empty, so the initial value stands.
        assert_eq!(cell.get(), Some("init".to_string()));
    }

    #[tokio::test]
    async fn test_persisted_value_replaces_initial() {
        let backend = ProbeBackend::new();
        let key = CacheKey::new("cell-load");
        backend.seed(&key, json!("persisted")).await;

        let cell = PersistedCell::new(key, Some("init".to_string()), backend.clone());
        settle().await;
        assert_eq!(cell.get(), Some("persisted".to_string()));
        // Adoption from storage must not write back.
        assert_eq!(backend.set_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_equal_write_does_not_persist() {
        let backend = ProbeBackend::new();
        let cell = PersistedCell::new(
            CacheKey::new("cell-equal-write"),
            Some(vec![1, 2, 3]),
            backend.clone(),
        );

        cell.set(Some(vec![1, 2, 3]));
        settle().await;
        assert_eq!(backend.set_calls.load(Ordering::SeqCst), 0);

        cell.set(Some(vec![4]));
        settle().await;
        assert_eq!(backend.set_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_absent_is_not_persisted() {
        let backend = ProbeBackend::new();
        let cell = PersistedCell::new(
            CacheKey::new("cell-absent"),
            Some("x".to_string()),
            backend.clone(),
        );

        cell.set(None);
        settle().await;
        assert_eq!(cell.get(), None);
        assert_eq!(backend.set_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_same_context_fan_out_persists_once() {
        let backend = ProbeBackend::new();
        let key = CacheKey::new("cell-fan-out");
        let a = PersistedCell::new(key.clone(), None::<String>, backend.clone());
        let b = PersistedCell::new(key, None::<String>, backend.clone());

        a.set(Some("shared".to_string()));
        settle().await;

        assert_eq!(b.get(), Some("shared".to_string()));
        // One logical write, one backend write.
        assert_eq!(backend.set_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remote_adoption_does_not_loop() {
        let backend = ProbeBackend::new();
        let key = CacheKey::new("cell-remote-adopt");
        let cell = PersistedCell::new(key.clone(), None::<String>, backend.clone());
        let sibling = PersistedCell::new(key, None::<String>, backend.clone());

        backend.fire(Some(json!("from another context")));
        settle().await;

        assert_eq!(cell.get(), Some("from another context".to_string()));
        // The sibling hears about it through the registry bridge.
        assert_eq!(sibling.get(), Some("from another context".to_string()));
        // Adoption never echoes back into the backend.
        assert_eq!(backend.set_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remote_removal_is_ignored() {
        let backend = ProbeBackend::new();
        let cell = PersistedCell::new(
            CacheKey::new("cell-remote-removal"),
            Some("kept".to_string()),
            backend.clone(),
        );

        backend.fire(None);
        settle().await;
        assert_eq!(cell.get(), Some("kept".to_string()));
    }

    #[tokio::test]
    async fn test_rekey_with_retention_keeps_value_visible() {
        let backend = ProbeBackend::new();
        let cell = PersistedCell::new(
            CacheKey::new("cell-rekey-a"),
            Some("init".to_string()),
            backend.clone(),
        );
        cell.set(Some("loaded".to_string()));
        settle().await;

        cell.rekey(CacheKey::new("cell-rekey-b"), None, true);
        // No flicker back to the initial value.
        assert_eq!(cell.get(), Some("loaded".to_string()));
        assert_eq!(cell.key(), CacheKey::new("cell-rekey-b"));

        cell.rekey(CacheKey::new("cell-rekey-c"), None, false);
        assert_eq!(cell.get(), Some("init".to_string()));
    }

    #[tokio::test]
    async fn test_rekey_shares_retained_value_with_new_neighborhood() {
        let backend = ProbeBackend::new();
        let other = PersistedCell::new(
            CacheKey::new("cell-neighborhood"),
            None::<String>,
            backend.clone(),
        );
        let cell = PersistedCell::new(
            CacheKey::new("cell-elsewhere"),
            Some("carried".to_string()),
            backend.clone(),
        );

        cell.rekey(CacheKey::new("cell-neighborhood"), None, true);
        assert_eq!(other.get(), Some("carried".to_string()));
    }

    #[tokio::test]
    async fn test_retained_value_is_provisional_until_written() {
        let backend = ProbeBackend::new();
        let cell = PersistedCell::new(
            CacheKey::new("cell-provisional-a"),
            None::<String>,
            backend.clone(),
        );
        cell.set(Some("old".to_string()));
        settle().await;
        assert!(!cell.is_provisional());

        cell.rekey(CacheKey::new("cell-provisional-b"), None, true);
        // Still visible, but not data for the new key.
        assert_eq!(cell.get(), Some("old".to_string()));
        assert!(cell.is_provisional());

        cell.set(Some("new".to_string()));
        assert!(!cell.is_provisional());
    }

    #[tokio::test]
    async fn test_persisted_load_settles_retained_value() {
        let backend = ProbeBackend::new();
        let new_key = CacheKey::new("cell-provisional-load");
        backend.seed(&new_key, json!("stored")).await;

        let cell = PersistedCell::new(
            CacheKey::new("cell-provisional-src"),
            Some("old".to_string()),
            backend.clone(),
        );
        cell.rekey(new_key, None, true);
        assert!(cell.is_provisional());

        settle().await;
        assert_eq!(cell.get(), Some("stored".to_string()));
        assert!(!cell.is_provisional());
    }

    #[tokio::test]
    async fn test_rekey_without_retention_is_not_provisional() {
        let backend = ProbeBackend::new();
        let cell = PersistedCell::new(
            CacheKey::new("cell-provisional-drop"),
            Some("init".to_string()),
            backend.clone(),
        );
        cell.rekey(CacheKey::new("cell-provisional-drop-2"), None, false);
        assert_eq!(cell.get(), Some("init".to_string()));
        assert!(!cell.is_provisional());
    }

    #[tokio::test]
    async fn test_stale_load_discarded_after_rekey() {
        let backend = ProbeBackend::slow(Duration::from_millis(40));
        let old_key = CacheKey::new("cell-stale-old");
        backend.seed(&old_key, json!("old value")).await;

        let cell = PersistedCell::new(old_key, Some("init".to_string()), backend.clone());
        // Rekey before the slow load for the old key lands.
        cell.rekey(CacheKey::new("cell-stale-new"), None, false);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cell.get(), Some("init".to_string()));
    }

    #[tokio::test]
    async fn test_reset_restores_initial_and_removes_record() {
        let backend = ProbeBackend::new();
        let key = CacheKey::new("cell-reset");
        let cell = PersistedCell::new(key.clone(), Some("init".to_string()), backend.clone());
        let sibling = PersistedCell::new(key.clone(), None::<String>, backend.clone());

        cell.set(Some("dirty".to_string()));
        settle().await;
        assert_eq!(sibling.get(), Some("dirty".to_string()));
        assert_eq!(backend.store.get(&key).await.expect("get should succeed"), Some(json!("dirty")));

        cell.reset().await;
        assert_eq!(cell.get(), Some("init".to_string()));
        // The initial value fans out to same-key siblings too.
        assert_eq!(sibling.get(), Some("init".to_string()));
        assert_eq!(backend.store.get(&key).await.expect("get should succeed"), None);
    }

    #[tokio::test]
    async fn test_destroy_is_terminal_and_idempotent() {
        let backend = ProbeBackend::new();
        let cell = PersistedCell::new(
            CacheKey::new("cell-destroy"),
            Some("kept".to_string()),
            backend.clone(),
        );

        cell.destroy();
        cell.destroy();
        assert_eq!(backend.cleanup_calls.load(Ordering::SeqCst), 1);

        backend.fire(Some(json!("late notification")));
        settle().await;
        assert_eq!(cell.get(), Some("kept".to_string()));
    }

    #[tokio::test]
    async fn test_lifecycle_with_debug_enabled() {
        let backend = ProbeBackend::new();
        let cell = PersistedCell::with_debug(
            CacheKey::new("cell-debug"),
            Some("init".to_string()),
            backend.clone(),
            true,
        );

        cell.set(Some("written".to_string()));
        settle().await;
        cell.rekey(CacheKey::new("cell-debug-2"), None, true);
        cell.reset().await;
        assert_eq!(cell.get(), Some("init".to_string()));
        cell.destroy();
    }

    #[tokio::test]
    async fn test_drop_unregisters() {
        let backend = ProbeBackend::new();
        let key = CacheKey::new("cell-drop");
        {
            let _cell = PersistedCell::new(key.clone(), None::<String>, backend.clone());
            assert_eq!(registry().live_count(&key), 1);
        }
        assert_eq!(registry().live_count(&key), 0);
    }
}
