//! Binding between a remote call and a persisted cache cell.
//!
//! A [`CachedCall`] wraps a [`RemoteCall`] transport and keeps its latest
//! result in a [`PersistedCell`], so repeat consumers read the cached value
//! synchronously while refreshes run in the background. The binding owns
//! the refresh state machine: cache hits short-circuit unforced refreshes,
//! forced refreshes invalidate the transport first, and a backend still in
//! its open handshake is polled until it settles. Observable flags travel
//! on a `tokio::sync::watch` channel.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::cell::{CacheValue, PersistedCell};
use crate::config::{effective_kind, CacheOptions};
use crate::error::{CacheError, ConfigError};
use crate::key::{argument_key, CacheKey};
use crate::store::{select_backend, StorageBackend, StoreOptions};

/// Transport errors are opaque to the cache; only their message is kept.
pub type CallError = Box<dyn std::error::Error + Send + Sync>;

/// Interval at which a refresh polls a backend whose open handshake is
/// still outstanding.
const OPEN_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// The remote side of a cached call.
#[async_trait]
pub trait RemoteCall: Send + Sync + 'static {
    /// Argument the call is keyed on.
    type Arg: Serialize + Clone + Send + Sync + 'static;
    /// Result value cached between calls.
    type Output: CacheValue;

    /// Perform the call.
    async fn call(&self, arg: Option<&Self::Arg>) -> Result<Self::Output, CallError>;

    /// Drop any transport-side cache so the next call hits the source.
    /// Invoked before a forced refresh. Best-effort.
    async fn invalidate(&self) -> Result<(), CallError> {
        Ok(())
    }

    /// The transport's own current value, when it maintains one. Adopted
    /// passively by [`CachedCall::sync_live`].
    fn live(&self) -> Option<Self::Output> {
        None
    }

    /// Whether the call is meaningless without an argument. When true, a
    /// refresh with no argument available fails fast instead of calling.
    fn requires_argument(&self) -> bool {
        false
    }
}

/// Observable state of a cached call.
#[derive(Debug, Clone, Default)]
pub struct CallState {
    /// True while the first value for the current key is being produced.
    pub loading: bool,
    /// True while any refresh is in flight.
    pub refreshing: bool,
    /// Message of the last transport failure, cleared on the next attempt.
    pub error: Option<String>,
    /// When the last refresh attempt finished, hit or miss.
    pub updated_at: Option<DateTime<Utc>>,
}

type ArgAccessor<A> = Box<dyn Fn() -> Option<A> + Send + Sync>;

struct BindingInner<C: RemoteCall> {
    call: C,
    cell: PersistedCell<C::Output>,
    logical_key: String,
    namespace: Option<String>,
    arg: ArgAccessor<C::Arg>,
    state: watch::Sender<CallState>,
    /// Argument key the cell is currently bound to, for change detection.
    bound_arg_key: Mutex<String>,
    auto_sync: bool,
    debug: bool,
}

/// A remote call bound to a persisted cache cell.
pub struct CachedCall<C: RemoteCall> {
    inner: Arc<BindingInner<C>>,
}

impl<C: RemoteCall> Clone for CachedCall<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

fn compose_key(logical: &str, arg_key: &str, namespace: Option<&str>) -> CacheKey {
    let key = CacheKey::compose(logical, arg_key);
    match namespace {
        Some(suffix) => key.with_namespace(suffix),
        None => key,
    }
}

impl<C: RemoteCall> CachedCall<C> {
    /// Bind `call` to a cache cell keyed on the current argument.
    ///
    /// The binding starts an unforced refresh immediately, so a cold cache
    /// fills itself and a warm cache merely flips `updated_at`.
    pub fn new(
        call: C,
        arg: impl Fn() -> Option<C::Arg> + Send + Sync + 'static,
        options: CacheOptions,
    ) -> Result<Self, CacheError> {
        Self::with_initial(call, arg, None, options)
    }

    /// Like [`CachedCall::new`], with a fallback value the cell shows until
    /// a persisted or fetched value replaces it.
    pub fn with_initial(
        call: C,
        arg: impl Fn() -> Option<C::Arg> + Send + Sync + 'static,
        initial: Option<C::Output>,
        options: CacheOptions,
    ) -> Result<Self, CacheError> {
        let kind = effective_kind(options.storage, options.sync_channels);
        let backend = select_backend(
            kind,
            &StoreOptions {
                root: options.root.clone(),
                ttl: options.ttl,
                codec: options.codec.clone(),
            },
        );
        Self::with_backend(call, arg, initial, backend, options)
    }

    /// Bind over an already-constructed backend instead of going through
    /// the selector.
    pub fn with_backend(
        call: C,
        arg: impl Fn() -> Option<C::Arg> + Send + Sync + 'static,
        initial: Option<C::Output>,
        backend: Arc<dyn StorageBackend>,
        options: CacheOptions,
    ) -> Result<Self, CacheError> {
        let logical_key = options.key.clone().unwrap_or_else(|| "anonymous".to_string());
        let arg: ArgAccessor<C::Arg> = Box::new(arg);
        let arg_key = argument_key(arg().as_ref())?;
        let key = compose_key(&logical_key, &arg_key, options.namespace.as_deref());

        let cell = PersistedCell::with_debug(key, initial, backend, options.debug);

        let (state, _) = watch::channel(CallState::default());
        let binding = Self {
            inner: Arc::new(BindingInner {
                call,
                cell,
                logical_key,
                namespace: options.namespace,
                arg,
                state,
                bound_arg_key: Mutex::new(arg_key),
                auto_sync: options.auto_sync,
                debug: options.debug,
            }),
        };
        binding.spawn_refresh(false);
        Ok(binding)
    }

    /// Force a refresh: invalidate the transport, call it, and adopt the
    /// result. Transport failures land in [`CallState::error`], not here.
    pub async fn refresh(&self) -> Result<(), CacheError> {
        run_refresh(&self.inner, true).await
    }

    /// Re-derive the cache key from the argument accessor and re-bind the
    /// cell if it changed. The current value stays visible while the new
    /// key refreshes.
    pub fn argument_changed(&self) -> Result<(), CacheError> {
        let arg_key = argument_key(self.inner.arg().as_ref())?;
        {
            let Ok(mut bound) = self.inner.bound_arg_key.lock() else {
                return Ok(());
            };
            if *bound == arg_key {
                return Ok(());
            }
            *bound = arg_key.clone();
        }

        let key = compose_key(
            &self.inner.logical_key,
            &arg_key,
            self.inner.namespace.as_deref(),
        );
        if self.inner.debug {
            tracing::debug!(key = %key, "argument changed; re-keying");
        }
        let retain = self.inner.cell.get().is_some();
        self.inner.cell.rekey(key, None, retain);
        self.spawn_refresh(false);
        Ok(())
    }

    /// Adopt the transport's live value, when it has one and passive
    /// adoption is enabled. Adoption of a differing value counts as a
    /// settle: `updated_at` is stamped and any recorded error cleared.
    pub fn sync_live(&self) {
        if !self.inner.auto_sync {
            return;
        }
        let Some(live) = self.inner.call.live() else {
            return;
        };
        if self.inner.cell.get().as_ref() == Some(&live) {
            return;
        }
        self.inner.cell.set(Some(live));
        self.inner.state.send_modify(|st| {
            st.error = None;
            st.updated_at = Some(Utc::now());
        });
    }

    /// The cached value. Synchronous.
    pub fn value(&self) -> Option<C::Output> {
        self.inner.cell.get()
    }

    /// Replace the cached value directly, bypassing the transport.
    pub fn set_value(&self, value: Option<C::Output>) {
        self.inner.cell.set(value);
        self.inner.state.send_modify(|st| {
            st.updated_at = Some(Utc::now());
        });
    }

    /// The cell backing this binding.
    pub fn cell(&self) -> &PersistedCell<C::Output> {
        &self.inner.cell
    }

    /// Watch-side of the observable state, for callers that want to react
    /// to flag changes instead of polling.
    pub fn state(&self) -> watch::Receiver<CallState> {
        self.inner.state.subscribe()
    }

    pub fn loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn refreshing(&self) -> bool {
        self.inner.state.borrow().refreshing
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.inner.state.borrow().updated_at
    }

    pub fn auto_sync(&self) -> bool {
        self.inner.auto_sync
    }

    /// Tear down the underlying cell. Idempotent.
    pub fn destroy(&self) {
        self.inner.cell.destroy();
    }

    fn spawn_refresh(&self, force: bool) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(key = %self.inner.logical_key, "no async runtime; refresh skipped");
            return;
        };
        let inner = self.inner.clone();
        runtime.spawn(async move {
            if let Err(e) = run_refresh(&inner, force).await {
                tracing::warn!(key = %inner.logical_key, error = %e, "background refresh failed");
            }
        });
    }
}

impl<C: RemoteCall> BindingInner<C> {
    fn arg(&self) -> Option<C::Arg> {
        (self.arg)()
    }
}

/// The refresh state machine.
///
/// Configuration mistakes (missing required argument) return `Err`;
/// transport failures are recorded in the observable state and return `Ok`.
async fn run_refresh<C: RemoteCall>(
    inner: &Arc<BindingInner<C>>,
    force: bool,
) -> Result<(), CacheError> {
    let arg = inner.arg();
    if inner.call.requires_argument() && arg.is_none() {
        return Err(ConfigError::MissingArgument {
            key: inner.logical_key.clone(),
        }
        .into());
    }

    // Responses are matched against the key they were issued for, so a
    // re-key during the call discards the stale result.
    let issued_key = inner.cell.key();
    inner.state.send_modify(|st| {
        st.refreshing = true;
        st.loading = inner.cell.get().is_none();
        st.error = None;
    });

    // Wait out the backend's open handshake so the persisted value gets a
    // chance to satisfy the refresh without a call.
    while inner.cell.is_loading() {
        tokio::time::sleep(OPEN_POLL_INTERVAL).await;
    }

    // A value retained across a rekey is visible but does not satisfy the
    // new key; only settled values count as a hit.
    if !force && inner.cell.get().is_some() && !inner.cell.is_provisional() {
        if inner.debug {
            tracing::debug!(key = %issued_key, "cache hit; refresh short-circuited");
        }
        inner.state.send_modify(|st| {
            st.refreshing = false;
            st.loading = false;
        });
        return Ok(());
    }

    if force {
        if let Err(e) = inner.call.invalidate().await {
            tracing::warn!(key = %issued_key, error = %e, "transport invalidation failed");
        }
    }

    let result = inner.call.call(arg.as_ref()).await;
    match result {
        Ok(output) => {
            if inner.cell.key() == issued_key {
                inner.cell.set(Some(output));
            } else if inner.debug {
                tracing::debug!(key = %issued_key, "response for superseded key discarded");
            }
        }
        Err(e) => {
            let message = e.to_string();
            tracing::warn!(key = %issued_key, error = %message, "remote call failed");
            inner.state.send_modify(|st| {
                st.error = Some(message);
            });
        }
    }

    inner.state.send_modify(|st| {
        st.refreshing = false;
        st.loading = false;
        st.updated_at = Some(Utc::now());
    });
    Ok(())
}
