//! Configuration for cache bindings.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::{JsonCodec, SharedCodec};
use crate::error::ConfigError;

/// The closed set of storage backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Process-shared in-memory map. No persistence, no change channels.
    Memory,
    /// File-per-key store scoped to the current process session. No change
    /// channels.
    Session,
    /// File-per-key store under a persistent directory, with change
    /// channels between backend instances.
    #[default]
    Local,
    /// LMDB environment, lazily opened, with change channels between
    /// backend instances.
    Database,
}

impl FromStr for StorageKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(Self::Memory),
            "session" => Ok(Self::Session),
            "local" => Ok(Self::Local),
            "database" => Ok(Self::Database),
            other => Err(ConfigError::UnsupportedStorage {
                kind: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Memory => "memory",
            Self::Session => "session",
            Self::Local => "local",
            Self::Database => "database",
        };
        f.write_str(name)
    }
}

/// Resolve the backend kind that will actually be used.
///
/// Change channels are a stronger requirement than the literal backend
/// choice: the session store has no cross-context primitive, so requesting
/// sync upgrades it to the local store.
pub fn effective_kind(kind: StorageKind, sync_channels: bool) -> StorageKind {
    if sync_channels && kind == StorageKind::Session {
        StorageKind::Local
    } else {
        kind
    }
}

/// Options for a [`CachedCall`](crate::CachedCall), all with defaults.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Logical key for the call. Defaults to `"anonymous"`.
    pub key: Option<String>,
    /// Which backend to persist through.
    pub storage: StorageKind,
    /// Whether writes should be announced to other contexts.
    pub sync_channels: bool,
    /// Entry time-to-live. `None` means never expire.
    pub ttl: Option<Duration>,
    /// Whether the transport's own live value is adopted passively.
    pub auto_sync: bool,
    /// Emit per-key lifecycle logging at debug level.
    pub debug: bool,
    /// Root directory for the file and database backends.
    pub root: Option<PathBuf>,
    /// Optional key namespace suffix.
    pub namespace: Option<String>,
    /// Codec used for stored payloads.
    pub codec: SharedCodec,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            key: None,
            storage: StorageKind::default(),
            sync_channels: true,
            ttl: None,
            auto_sync: true,
            debug: false,
            root: None,
            namespace: None,
            codec: Arc::new(JsonCodec),
        }
    }
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the logical key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the storage kind.
    pub fn with_storage(mut self, kind: StorageKind) -> Self {
        self.storage = kind;
        self
    }

    /// Enable or disable cross-context change channels.
    pub fn with_sync_channels(mut self, enabled: bool) -> Self {
        self.sync_channels = enabled;
        self
    }

    /// Set the entry TTL directly.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the entry TTL in minutes.
    pub fn with_timeout_minutes(mut self, minutes: u64) -> Self {
        self.ttl = Some(Duration::from_secs(minutes * 60));
        self
    }

    /// Enable or disable passive adoption of the transport's live value.
    pub fn with_auto_sync(mut self, enabled: bool) -> Self {
        self.auto_sync = enabled;
        self
    }

    /// Enable per-key lifecycle logging.
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Set the root directory for on-disk backends.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Set a key namespace suffix.
    pub fn with_namespace(mut self, suffix: impl Into<String>) -> Self {
        self.namespace = Some(suffix.into());
        self
    }

    /// Replace the payload codec.
    pub fn with_codec(mut self, codec: SharedCodec) -> Self {
        self.codec = codec;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_is_fatal() {
        let err = "redis".parse::<StorageKind>().expect_err("should reject");
        assert_eq!(
            err,
            ConfigError::UnsupportedStorage {
                kind: "redis".to_string()
            }
        );
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            StorageKind::Memory,
            StorageKind::Session,
            StorageKind::Local,
            StorageKind::Database,
        ] {
            let parsed: StorageKind = kind.to_string().parse().expect("should parse");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_session_upgrades_when_sync_requested() {
        assert_eq!(
            effective_kind(StorageKind::Session, true),
            StorageKind::Local
        );
        assert_eq!(
            effective_kind(StorageKind::Session, false),
            StorageKind::Session
        );
        assert_eq!(
            effective_kind(StorageKind::Memory, true),
            StorageKind::Memory
        );
    }

    #[test]
    fn test_options_builder() {
        let options = CacheOptions::new()
            .with_key("user-profile")
            .with_storage(StorageKind::Database)
            .with_sync_channels(false)
            .with_timeout_minutes(5)
            .with_auto_sync(false)
            .with_debug(true)
            .with_namespace("draft");

        assert_eq!(options.key.as_deref(), Some("user-profile"));
        assert_eq!(options.storage, StorageKind::Database);
        assert!(!options.sync_channels);
        assert_eq!(options.ttl, Some(Duration::from_secs(300)));
        assert!(!options.auto_sync);
        assert!(options.debug);
        assert_eq!(options.namespace.as_deref(), Some("draft"));
    }
}
