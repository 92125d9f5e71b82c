//! Client-side catalog browsing: genre filters, sort orders and related items.

use std::{cmp::Ordering, fmt, str::FromStr};

use thiserror::Error;

use crate::domain::catalog::CatalogItem;

/// Number of related items shown under an item's details.
pub const RELATED_ITEMS_LIMIT: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Delivery order (newest first).
    #[default]
    Default,
    PriceAsc,
    PriceDesc,
    /// Highest rated first.
    Rating,
}

#[derive(Debug, Error)]
#[error("unknown sort order `{0}` (expected default, price-asc, price-desc or rating)")]
pub struct ParseSortOrderError(String);

impl FromStr for SortOrder {
    type Err = ParseSortOrderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "default" => Ok(SortOrder::Default),
            "price-asc" => Ok(SortOrder::PriceAsc),
            "price-desc" => Ok(SortOrder::PriceDesc),
            "rating" => Ok(SortOrder::Rating),
            other => Err(ParseSortOrderError(other.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Default => "default",
            SortOrder::PriceAsc => "price-asc",
            SortOrder::PriceDesc => "price-desc",
            SortOrder::Rating => "rating",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Restrict to one genre; `None` shows everything.
    pub genre: Option<String>,
    pub sort: SortOrder,
}

impl CatalogQuery {
    pub fn apply(&self, items: &[CatalogItem]) -> Vec<CatalogItem> {
        let mut selected: Vec<CatalogItem> = items
            .iter()
            .filter(|item| {
                self.genre
                    .as_deref()
                    .is_none_or(|genre| item.genre == genre)
            })
            .cloned()
            .collect();

        match self.sort {
            SortOrder::Default => {}
            SortOrder::PriceAsc => selected.sort_by(|a, b| compare_f64(a.price, b.price)),
            SortOrder::PriceDesc => selected.sort_by(|a, b| compare_f64(b.price, a.price)),
            SortOrder::Rating => selected.sort_by(|a, b| compare_f64(b.rating, a.rating)),
        }
        selected
    }
}

fn compare_f64(left: f64, right: f64) -> Ordering {
    left.total_cmp(&right)
}

pub fn find_item<'a>(items: &'a [CatalogItem], id: &str) -> Option<&'a CatalogItem> {
    items.iter().find(|item| item.id == id)
}

/// Items of the same genre, excluding `item` itself, in catalog order.
pub fn related_items<'a>(
    items: &'a [CatalogItem],
    item: &CatalogItem,
    limit: usize,
) -> Vec<&'a CatalogItem> {
    items
        .iter()
        .filter(|candidate| candidate.genre == item.genre && candidate.id != item.id)
        .take(limit)
        .collect()
}

/// Item count per genre, in the order of `names`.
pub fn genre_counts(items: &[CatalogItem], names: &[String]) -> Vec<(String, usize)> {
    names
        .iter()
        .map(|name| {
            let count = items.iter().filter(|item| &item.genre == name).count();
            (name.clone(), count)
        })
        .collect()
}
