//! restash - Persisted Reactive Cache for Remote Calls
//!
//! Caches the results of asynchronous remote calls in pluggable storage
//! backends, so values read synchronously and survive restarts. One cache
//! cell per key; cells bound to the same key in one process stay in sync
//! through a registry, and backends with change channels keep separate
//! contexts in sync as well.
//!
//! The main entry point is [`CachedCall`], which binds a [`RemoteCall`]
//! transport to a [`PersistedCell`] and drives the refresh lifecycle.

pub mod binding;
pub mod cell;
pub mod codec;
pub mod config;
pub mod error;
pub mod key;
pub mod record;
mod registry;
pub mod store;

pub use binding::{CachedCall, CallError, CallState, RemoteCall};
pub use cell::{CacheValue, PersistedCell};
pub use codec::{CodecError, JsonCodec, SharedCodec, ValueCodec};
pub use config::{effective_kind, CacheOptions, StorageKind};
pub use error::{CacheError, ConfigError, StoreError, StoreResult};
pub use key::{argument_key, canonical_json, CacheKey};

// Re-export backend types for callers that construct backends directly
pub use store::{
    select_backend, DatabaseStore, LocalStore, MemoryStore, SessionStore, StorageBackend,
    StoreOptions, SyncCallback, SyncCleanup,
};
