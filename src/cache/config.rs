//! Cache configuration.
//!
//! Controls TTLs, association capacity and the featured-rail fallback via `librarise.toml`.

use std::{num::NonZeroUsize, time::Duration};

const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_TAXONOMY_TTL: Duration = Duration::from_secs(10 * 60);
const DEFAULT_ASSOCIATION_CAPACITY: usize = 50;
const DEFAULT_FEATURED_FALLBACK_COUNT: usize = 4;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Lifetime of the cached catalog listing.
    pub catalog_ttl: Duration,
    /// Lifetime of the cached taxonomy tree and its variant index.
    pub taxonomy_ttl: Duration,
    /// Maximum remembered item to taxonomy associations.
    pub association_capacity: usize,
    /// Items shown on the featured rail when none are flagged.
    pub featured_fallback_count: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            catalog_ttl: DEFAULT_CATALOG_TTL,
            taxonomy_ttl: DEFAULT_TAXONOMY_TTL,
            association_capacity: DEFAULT_ASSOCIATION_CAPACITY,
            featured_fallback_count: DEFAULT_FEATURED_FALLBACK_COUNT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            catalog_ttl: settings.catalog_ttl,
            taxonomy_ttl: settings.taxonomy_ttl,
            association_capacity: settings.association_capacity.get(),
            featured_fallback_count: settings.featured_fallback_count.get(),
        }
    }
}

impl CacheConfig {
    /// Returns the association capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn association_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.association_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
