//! Time-bounded typed cache entries.

use std::{marker::PhantomData, sync::Arc, time::Duration};

use metrics::counter;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::durable::DurableStore;
use super::keys::CacheKey;

pub(crate) const METRIC_CACHE_HIT: &str = "librarise_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "librarise_cache_miss_total";
pub(crate) const METRIC_CACHE_EXPIRED: &str = "librarise_cache_expired_total";

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    payload: T,
    stored_at_ms: i64,
}

/// Typed view over one durable key whose value expires after `ttl`.
///
/// Reads never fail: a missing, expired, malformed or wrongly shaped record reads as
/// absent and is purged. Writes never fail either; storage errors are logged and the
/// cache degrades to network-only behaviour.
pub struct TtlCache<T> {
    store: Arc<dyn DurableStore>,
    key: CacheKey,
    ttl: Duration,
    _payload: PhantomData<fn() -> T>,
}

impl<T> TtlCache<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn DurableStore>, key: CacheKey, ttl: Duration) -> Self {
        Self {
            store,
            key,
            ttl,
            _payload: PhantomData,
        }
    }

    pub fn read(&self) -> Option<T> {
        self.read_at(OffsetDateTime::now_utc())
    }

    /// Reads the payload as of `now`.
    ///
    /// Entries stamped later than `now` are treated as expired so a skewed clock can
    /// never pin an entry forever.
    pub fn read_at(&self, now: OffsetDateTime) -> Option<T> {
        let raw = match self.store.get(self.key.as_str()) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.record_miss();
                return None;
            }
            Err(err) => {
                warn!(cache = self.key.label(), error = %err, "Durable cache read failed");
                self.record_miss();
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                debug!(cache = self.key.label(), error = %err, "Discarding malformed cache entry");
                self.purge();
                self.record_miss();
                return None;
            }
        };

        let age_ms = unix_millis(now).saturating_sub(entry.stored_at_ms);
        if age_ms < 0 || age_ms as u128 > self.ttl.as_millis() {
            debug!(cache = self.key.label(), age_ms, "Cache entry expired");
            counter!(METRIC_CACHE_EXPIRED, "cache" => self.key.label()).increment(1);
            self.purge();
            self.record_miss();
            return None;
        }

        counter!(METRIC_CACHE_HIT, "cache" => self.key.label()).increment(1);
        debug!(cache = self.key.label(), age_ms, "Cache hit");
        Some(entry.payload)
    }

    pub fn write(&self, payload: &T) {
        self.write_at(payload, OffsetDateTime::now_utc());
    }

    pub fn write_at(&self, payload: &T, now: OffsetDateTime) {
        let entry = CacheEntry {
            payload,
            stored_at_ms: unix_millis(now),
        };
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(cache = self.key.label(), error = %err, "Failed to encode cache entry");
                return;
            }
        };
        if let Err(err) = self.store.put(self.key.as_str(), &raw) {
            warn!(cache = self.key.label(), error = %err, "Durable cache write failed");
        }
    }

    /// Removes the stored record, ignoring storage errors.
    pub fn purge(&self) {
        if let Err(err) = self.store.remove(self.key.as_str()) {
            warn!(cache = self.key.label(), error = %err, "Durable cache purge failed");
        }
    }

    fn record_miss(&self) {
        counter!(METRIC_CACHE_MISS, "cache" => self.key.label()).increment(1);
    }
}

fn unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}
