//! Named-channel pub/sub between backend instances.
//!
//! This is the Rust rendition of the host broadcast primitive: each
//! channel is scoped to a store identity plus a cache key, so only
//! subscribers for the exact key react. Events carry the id of the backend
//! instance that published them, and subscribers skip their own instance's
//! events — a writer never observes its own write, matching host
//! storage-event semantics. Delivery is in-process; independent backend
//! instances over the same underlying store play the role of other
//! contexts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use serde_json::Value;
use uuid::Uuid;

use super::{SyncCallback, SyncCleanup};
use crate::key::CacheKey;

struct Subscriber {
    id: Uuid,
    /// Backend instance the subscriber belongs to; used to filter out the
    /// publisher's own events.
    instance: Uuid,
    callback: Arc<dyn Fn(Option<Value>) + Send + Sync>,
}

pub(crate) struct ChangeHub {
    channels: Mutex<HashMap<String, Vec<Subscriber>>>,
}

static HUB: Lazy<ChangeHub> = Lazy::new(|| ChangeHub {
    channels: Mutex::new(HashMap::new()),
});

pub(crate) fn hub() -> &'static ChangeHub {
    &HUB
}

/// Channel name for a store scope plus key.
pub(crate) fn channel_name(scope: &str, key: &CacheKey) -> String {
    format!("{scope}::{key}")
}

impl ChangeHub {
    /// Register a subscriber on `channel` for the given backend instance.
    pub fn subscribe(&self, channel: String, instance: Uuid, callback: SyncCallback) -> SyncCleanup {
        let id = Uuid::now_v7();
        if let Ok(mut channels) = self.channels.lock() {
            channels.entry(channel.clone()).or_default().push(Subscriber {
                id,
                instance,
                callback: Arc::from(callback),
            });
        }
        SyncCleanup::new(move || hub().unsubscribe(&channel, id))
    }

    fn unsubscribe(&self, channel: &str, id: Uuid) {
        if let Ok(mut channels) = self.channels.lock() {
            if let Some(subscribers) = channels.get_mut(channel) {
                subscribers.retain(|s| s.id != id);
                if subscribers.is_empty() {
                    channels.remove(channel);
                }
            }
        }
    }

    /// Deliver `payload` to every subscriber on `channel` except those
    /// belonging to the publishing instance.
    pub fn publish(&self, channel: &str, origin: Uuid, payload: Option<&Value>) {
        // Snapshot outside the lock so callbacks may re-enter the hub.
        let targets: Vec<Arc<dyn Fn(Option<Value>) + Send + Sync>> = match self.channels.lock() {
            Ok(channels) => channels
                .get(channel)
                .map(|subscribers| {
                    subscribers
                        .iter()
                        .filter(|s| s.instance != origin)
                        .map(|s| s.callback.clone())
                        .collect()
                })
                .unwrap_or_default(),
            Err(_) => return,
        };

        for callback in targets {
            callback(payload.cloned());
        }
    }

    #[cfg(test)]
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .map(|channels| channels.get(channel).map_or(0, |s| s.len()))
            .unwrap_or(0)
    }
}
