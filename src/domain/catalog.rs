//! Catalog entities: the remote item record and the item the storefront renders.

use serde::{Deserialize, Serialize};

/// Item record as delivered by the remote catalog or a local fallback file.
///
/// Optional columns tolerate both `null` and absence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub price: f64,
    #[serde(default)]
    pub discount: Option<f64>,
    pub genre: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub author: String,
    pub price: f64,
    /// Percentage off the list price, `0..=100`.
    pub discount: u8,
    pub genre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub description: String,
    pub rating: f64,
    pub cover: String,
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl CatalogItem {
    /// Final price after discount, rounded to the nearest whole unit.
    pub fn discounted_price(&self) -> f64 {
        if self.discount == 0 {
            return self.price;
        }
        (self.price * (1.0 - f64::from(self.discount) / 100.0)).round()
    }
}

impl From<ItemRecord> for CatalogItem {
    fn from(record: ItemRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            author: record.author,
            price: record.price,
            discount: clamp_discount(record.discount),
            genre: record.genre,
            subcategory: record.subcategory.filter(|value| !value.trim().is_empty()),
            description: record.description.unwrap_or_default(),
            rating: record.rating.unwrap_or_default(),
            cover: record.cover.unwrap_or_default(),
            featured: record.featured.unwrap_or(false),
            publisher: record.publisher,
            pages: record.pages,
            year: record.year,
        }
    }
}

fn clamp_discount(raw: Option<f64>) -> u8 {
    match raw {
        Some(value) if value.is_finite() => value.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

/// A complete catalog listing: every item plus the featured rail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogListing {
    pub items: Vec<CatalogItem>,
    pub featured: Vec<CatalogItem>,
}

impl CatalogListing {
    /// Builds a listing, keeping `items` in delivery order.
    ///
    /// The featured rail is the flagged subset; when nothing is flagged it falls back to
    /// the first `fallback_count` items so the rail is never empty while items exist.
    pub fn from_items(items: Vec<CatalogItem>, fallback_count: usize) -> Self {
        let flagged: Vec<CatalogItem> = items
            .iter()
            .filter(|item| item.featured)
            .cloned()
            .collect();
        let featured = if flagged.is_empty() {
            items.iter().take(fallback_count).cloned().collect()
        } else {
            flagged
        };
        Self { items, featured }
    }
}
