//! Librarise Cache System
//!
//! Durable, synchronously readable caches behind the storefront's stale-while-revalidate
//! loaders and the theme resolver:
//!
//! - **TTL caches**: catalog listing (5 min), taxonomy tree and variant index (10 min)
//! - **Association cache**: bounded FIFO map from item id to genre name
//!
//! All of them live in one [`DurableStore`] and are owned by a [`CacheService`].
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! catalog_ttl_seconds = 300
//! taxonomy_ttl_seconds = 600
//! association_capacity = 50
//! featured_fallback_count = 4
//! ```

mod association;
mod config;
mod durable;
mod keys;
mod lock;
mod service;
mod ttl;

pub use association::AssociationCache;
pub(crate) use association::METRIC_CACHE_EVICT;
pub use config::CacheConfig;
pub use durable::{DurableStore, FileStore, MemoryStore, StoreError};
pub use keys::CacheKey;
pub(crate) use lock::{rw_read, rw_write};
pub use service::CacheService;
pub use ttl::TtlCache;
pub(crate) use ttl::{METRIC_CACHE_EXPIRED, METRIC_CACHE_HIT, METRIC_CACHE_MISS};
