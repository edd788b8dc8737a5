//! Same-context cell registry.
//!
//! Process-wide table mapping each cache key to the live cells currently
//! bound to it. Writing one cell fans the new value out to every sibling
//! under the same key instantly, without touching storage. Fan-out works
//! over a snapshot, so siblings may register or drop concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use once_cell::sync::Lazy;
use serde_json::Value;
use uuid::Uuid;

use crate::key::CacheKey;

/// A cell as seen by the registry: something that can adopt a serialized
/// value produced by a sibling. `None` means absent.
pub(crate) trait RegisteredCell: Send + Sync {
    fn adopt(&self, payload: Option<&Value>);
}

struct Entry {
    id: Uuid,
    cell: Weak<dyn RegisteredCell>,
}

pub(crate) struct CellRegistry {
    entries: Mutex<HashMap<String, Vec<Entry>>>,
}

static REGISTRY: Lazy<CellRegistry> = Lazy::new(|| CellRegistry {
    entries: Mutex::new(HashMap::new()),
});

pub(crate) fn registry() -> &'static CellRegistry {
    &REGISTRY
}

impl CellRegistry {
    pub fn register(&self, key: &CacheKey, id: Uuid, cell: Weak<dyn RegisteredCell>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries
                .entry(key.to_string())
                .or_default()
                .push(Entry { id, cell });
        }
    }

    pub fn unregister(&self, key: &CacheKey, id: Uuid) {
        if let Ok(mut entries) = self.entries.lock() {
            if let Some(cells) = entries.get_mut(key.as_str()) {
                cells.retain(|e| e.id != id && e.cell.strong_count() > 0);
                if cells.is_empty() {
                    entries.remove(key.as_str());
                }
            }
        }
    }

    /// Deliver `payload` to every live cell under `key` except `source`.
    pub fn broadcast(&self, key: &CacheKey, source: Uuid, payload: Option<&Value>) {
        // Snapshot under the lock, adopt outside it: adoption takes each
        // sibling's own state lock.
        let targets: Vec<Arc<dyn RegisteredCell>> = match self.entries.lock() {
            Ok(entries) => entries
                .get(key.as_str())
                .map(|cells| {
                    cells
                        .iter()
                        .filter(|e| e.id != source)
                        .filter_map(|e| e.cell.upgrade())
                        .collect()
                })
                .unwrap_or_default(),
            Err(_) => return,
        };

        for cell in targets {
            cell.adopt(payload);
        }
    }

    #[cfg(test)]
    pub fn live_count(&self, key: &CacheKey) -> usize {
        self.entries
            .lock()
            .map(|entries| {
                entries
                    .get(key.as_str())
                    .map_or(0, |cells| cells.iter().filter(|e| e.cell.strong_count() > 0).count())
            })
            .unwrap_or(0)
    }
}
