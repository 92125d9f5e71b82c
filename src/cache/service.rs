//! Explicitly constructed owner of the durable store and every typed cache.

use std::sync::Arc;

use tracing::info;

use crate::domain::catalog::CatalogListing;
use crate::domain::taxonomy::{NameVariantIndex, TaxonomyNode};

use super::association::AssociationCache;
use super::config::CacheConfig;
use super::durable::{DurableStore, MemoryStore};
use super::keys::CacheKey;
use super::ttl::TtlCache;

/// Cache service shared by loaders and the theme resolver.
///
/// Construct once with [`CacheService::init`] and pass it around as `Arc<CacheService>`.
/// Each typed cache owns a disjoint key, so no cross-cache locking is needed.
pub struct CacheService {
    config: CacheConfig,
    catalog: TtlCache<CatalogListing>,
    taxonomy: TtlCache<Vec<TaxonomyNode>>,
    variant_index: TtlCache<NameVariantIndex>,
    associations: AssociationCache,
}

impl CacheService {
    pub fn init(store: Arc<dyn DurableStore>, config: CacheConfig) -> Self {
        let catalog = TtlCache::new(store.clone(), CacheKey::Catalog, config.catalog_ttl);
        let taxonomy = TtlCache::new(store.clone(), CacheKey::Taxonomy, config.taxonomy_ttl);
        let variant_index =
            TtlCache::new(store.clone(), CacheKey::VariantIndex, config.taxonomy_ttl);
        let associations =
            AssociationCache::hydrate(store.clone(), config.association_capacity_non_zero());

        info!(
            catalog_ttl_secs = config.catalog_ttl.as_secs(),
            taxonomy_ttl_secs = config.taxonomy_ttl.as_secs(),
            association_capacity = associations.capacity(),
            "Cache service initialised"
        );

        Self {
            config,
            catalog,
            taxonomy,
            variant_index,
            associations,
        }
    }

    /// Service over a fresh in-memory store; nothing survives the process.
    pub fn in_memory(config: CacheConfig) -> Self {
        Self::init(Arc::new(MemoryStore::new()), config)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn catalog(&self) -> &TtlCache<CatalogListing> {
        &self.catalog
    }

    pub fn taxonomy(&self) -> &TtlCache<Vec<TaxonomyNode>> {
        &self.taxonomy
    }

    pub fn variant_index(&self) -> &TtlCache<NameVariantIndex> {
        &self.variant_index
    }

    pub fn associations(&self) -> &AssociationCache {
        &self.associations
    }

    /// Call when a view reveals which genre an item belongs to.
    pub fn remember_association(&self, item_id: &str, taxonomy_name: &str) {
        self.associations.remember(item_id, taxonomy_name);
    }

    /// Variant flag recorded for `name` in the persisted index, if any.
    pub fn cached_variant_flag(&self, name: &str) -> Option<bool> {
        self.variant_index.read()?.get(name)
    }

    /// Drops every durable record owned by this service.
    pub fn purge_all(&self) {
        self.catalog.purge();
        self.taxonomy.purge();
        self.variant_index.purge();
        self.associations.clear();
        info!("Durable caches purged");
    }
}
