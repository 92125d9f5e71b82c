//! Bounded item to taxonomy-name associations.
//!
//! Remembers which genre an item belongs to independently of whether the catalog has
//! loaded, so a detail view can pick its presentation variant on first render. Eviction
//! is strictly by insertion order: lookups never reorder, and overwriting a known item
//! keeps its original position.

use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex},
};

use lru::LruCache;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::durable::DurableStore;
use super::keys::CacheKey;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::association";
pub(crate) const METRIC_CACHE_EVICT: &str = "librarise_cache_evict_total";

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedAssociations {
    /// Oldest insertion first.
    entries: Vec<PersistedAssociation>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedAssociation {
    item_id: String,
    taxonomy_name: String,
}

/// FIFO-bounded `item id -> taxonomy name` map, written through to the durable store.
///
/// Backed by an [`LruCache`] that is only ever touched through non-promoting calls
/// (`peek`, `peek_mut`, `push` of new keys), so its recency order is insertion order.
pub struct AssociationCache {
    store: Arc<dyn DurableStore>,
    entries: Mutex<LruCache<String, String>>,
}

impl AssociationCache {
    /// Loads persisted associations; an unreadable blob hydrates as empty.
    pub fn hydrate(store: Arc<dyn DurableStore>, capacity: NonZeroUsize) -> Self {
        let mut entries = LruCache::new(capacity);
        for persisted in load_persisted(store.as_ref()).entries {
            if entries.contains(&persisted.item_id) {
                if let Some(name) = entries.peek_mut(&persisted.item_id) {
                    *name = persisted.taxonomy_name;
                }
            } else {
                entries.push(persisted.item_id, persisted.taxonomy_name);
            }
        }
        debug!(
            cache = CacheKey::ItemTaxonomy.label(),
            restored = entries.len(),
            "Hydrated item associations"
        );
        Self {
            store,
            entries: Mutex::new(entries),
        }
    }

    /// Records that `item_id` belongs to `taxonomy_name`. Blank inputs are ignored.
    pub fn remember(&self, item_id: &str, taxonomy_name: &str) {
        if item_id.trim().is_empty() || taxonomy_name.trim().is_empty() {
            return;
        }

        let mut entries = mutex_lock(&self.entries, SOURCE, "remember");
        if let Some(existing) = entries.peek_mut(item_id) {
            if existing == taxonomy_name {
                return;
            }
            *existing = taxonomy_name.to_string();
        } else if let Some((evicted, _)) =
            entries.push(item_id.to_string(), taxonomy_name.to_string())
        {
            counter!(METRIC_CACHE_EVICT, "cache" => CacheKey::ItemTaxonomy.label()).increment(1);
            debug!(evicted_item = %evicted, "Evicted oldest item association");
        }

        self.persist(&entries);
    }

    pub fn lookup(&self, item_id: &str) -> Option<String> {
        mutex_lock(&self.entries, SOURCE, "lookup")
            .peek(item_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "capacity").cap().get()
    }

    /// Item ids from oldest to newest insertion.
    pub fn item_ids(&self) -> Vec<String> {
        mutex_lock(&self.entries, SOURCE, "item_ids")
            .iter()
            .rev()
            .map(|(item_id, _)| item_id.clone())
            .collect()
    }

    pub fn clear(&self) {
        let mut entries = mutex_lock(&self.entries, SOURCE, "clear");
        entries.clear();
        if let Err(err) = self.store.remove(CacheKey::ItemTaxonomy.as_str()) {
            warn!(
                cache = CacheKey::ItemTaxonomy.label(),
                error = %err,
                "Failed to clear item associations"
            );
        }
    }

    fn persist(&self, entries: &LruCache<String, String>) {
        let persisted = PersistedAssociations {
            entries: entries
                .iter()
                .rev()
                .map(|(item_id, taxonomy_name)| PersistedAssociation {
                    item_id: item_id.clone(),
                    taxonomy_name: taxonomy_name.clone(),
                })
                .collect(),
        };
        let raw = match serde_json::to_string(&persisted) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(
                    cache = CacheKey::ItemTaxonomy.label(),
                    error = %err,
                    "Failed to encode item associations"
                );
                return;
            }
        };
        if let Err(err) = self.store.put(CacheKey::ItemTaxonomy.as_str(), &raw) {
            warn!(
                cache = CacheKey::ItemTaxonomy.label(),
                error = %err,
                "Durable cache write failed"
            );
        }
    }
}

fn load_persisted(store: &dyn DurableStore) -> PersistedAssociations {
    let raw = match store.get(CacheKey::ItemTaxonomy.as_str()) {
        Ok(Some(raw)) => raw,
        Ok(None) => return PersistedAssociations::default(),
        Err(err) => {
            warn!(
                cache = CacheKey::ItemTaxonomy.label(),
                error = %err,
                "Durable cache read failed"
            );
            return PersistedAssociations::default();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|err| {
        debug!(
            cache = CacheKey::ItemTaxonomy.label(),
            error = %err,
            "Discarding malformed item associations"
        );
        PersistedAssociations::default()
    })
}
