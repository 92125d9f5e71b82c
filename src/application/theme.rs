//! Synchronous presentation-variant resolution.
//!
//! Decides whether content belongs to a children's genre using only what is already in
//! memory or in the durable cache, so the first render can pick the right variant
//! without waiting for the network.
//!
//! Resolution order:
//!
//! 1. The loaded taxonomy tree, if it has a node with the requested name.
//! 2. The persisted name to variant index; unknown names resolve to standard.
//! 3. For an item id alone, the remembered item association, then steps 1 and 2.

use std::sync::Arc;

use serde::Serialize;
use tracing::trace;

use crate::application::taxonomy::TaxonomyLoader;
use crate::cache::CacheService;

/// What a view knows when it asks for a variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantQuery {
    pub taxonomy_name: Option<String>,
    pub item_id: Option<String>,
}

impl VariantQuery {
    pub fn taxonomy(name: impl Into<String>) -> Self {
        Self {
            taxonomy_name: Some(name.into()),
            item_id: None,
        }
    }

    pub fn item(item_id: impl Into<String>) -> Self {
        Self {
            taxonomy_name: None,
            item_id: Some(item_id.into()),
        }
    }

    fn name(&self) -> Option<&str> {
        non_blank(self.taxonomy_name.as_deref())
    }

    fn item_id(&self) -> Option<&str> {
        non_blank(self.item_id.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Standard,
    Children,
}

impl From<bool> for Variant {
    fn from(flag: bool) -> Self {
        if flag { Variant::Children } else { Variant::Standard }
    }
}

pub struct ThemeResolver {
    cache: Arc<CacheService>,
    live: Option<Arc<TaxonomyLoader>>,
}

impl ThemeResolver {
    pub fn new(cache: Arc<CacheService>) -> Self {
        Self { cache, live: None }
    }

    /// Consults the loader's in-memory tree before any cached data.
    pub fn with_live_taxonomy(mut self, loader: Arc<TaxonomyLoader>) -> Self {
        self.live = Some(loader);
        self
    }

    /// Returns `true` when the children variant applies. Never blocks and never fails.
    pub fn resolve(&self, query: &VariantQuery) -> bool {
        if let Some(name) = query.name() {
            return self.resolve_name(name);
        }

        let Some(item_id) = query.item_id() else {
            return false;
        };
        match self.cache.associations().lookup(item_id) {
            Some(name) => {
                trace!(item_id, taxonomy = %name, "Resolved item through association");
                self.resolve_name(&name)
            }
            None => false,
        }
    }

    pub fn variant(&self, query: &VariantQuery) -> Variant {
        Variant::from(self.resolve(query))
    }

    fn resolve_name(&self, name: &str) -> bool {
        if let Some(flag) = self.live_flag(name) {
            trace!(taxonomy = name, flag, "Resolved from live taxonomy");
            return flag;
        }
        self.cache.cached_variant_flag(name).unwrap_or(false)
    }

    fn live_flag(&self, name: &str) -> Option<bool> {
        let state = self.live.as_ref()?.state();
        state.find(name).map(|node| node.variant_flag)
    }
}
