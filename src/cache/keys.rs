//! Durable-store keys.
//!
//! Each cache owns exactly one key. The trailing version segment changes whenever the
//! stored shape changes, so old blobs are never parsed as the new format.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Catalog listing (items plus featured rail).
    Catalog,
    /// Built taxonomy forest.
    Taxonomy,
    /// Flattened taxonomy name to variant flag index.
    VariantIndex,
    /// Item id to taxonomy name associations.
    ItemTaxonomy,
}

impl CacheKey {
    pub const ALL: [CacheKey; 4] = [
        CacheKey::Catalog,
        CacheKey::Taxonomy,
        CacheKey::VariantIndex,
        CacheKey::ItemTaxonomy,
    ];

    /// Key under which the blob is stored.
    pub fn as_str(self) -> &'static str {
        match self {
            CacheKey::Catalog => "librarise.catalog.v2",
            CacheKey::Taxonomy => "librarise.taxonomy.v2",
            CacheKey::VariantIndex => "librarise.variant_index.v1",
            CacheKey::ItemTaxonomy => "librarise.item_taxonomy.v1",
        }
    }

    /// Short label used in logs and metrics.
    pub fn label(self) -> &'static str {
        match self {
            CacheKey::Catalog => "catalog",
            CacheKey::Taxonomy => "taxonomy",
            CacheKey::VariantIndex => "variant_index",
            CacheKey::ItemTaxonomy => "item_taxonomy",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
