//! Stale-while-revalidate catalog loader.
//!
//! Loading is split in two phases so any runtime can drive it:
//!
//! 1. [`CatalogLoader::load_from_cache`] seeds state synchronously from the durable cache.
//! 2. [`CatalogLoader::refresh`] fetches the remote catalog and replaces state.
//!
//! Views use [`CatalogLoader::mount`] followed by [`CatalogLoader::revalidate`], which
//! never surfaces a failure: stale data beats an error screen.

use std::{sync::Arc, time::Instant};

use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::application::error::RefreshError;
use crate::application::repos::CatalogSource;
use crate::application::state::{RequestSequence, StateCell};
use crate::cache::CacheService;
use crate::domain::catalog::{CatalogItem, CatalogListing};

const RESOURCE: &str = "catalog";
pub(crate) const METRIC_REFRESH_MS: &str = "librarise_refresh_ms";
pub(crate) const METRIC_REFRESH_DISCARDED: &str = "librarise_refresh_discarded_total";

/// Reactive catalog state consumed by views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogState {
    pub items: Vec<CatalogItem>,
    pub featured_items: Vec<CatalogItem>,
    pub is_loading: bool,
}

impl CatalogState {
    fn loading() -> Self {
        Self {
            items: Vec::new(),
            featured_items: Vec::new(),
            is_loading: true,
        }
    }

    fn ready(listing: CatalogListing) -> Self {
        Self {
            items: listing.items,
            featured_items: listing.featured,
            is_loading: false,
        }
    }

    fn settled(&self) -> Self {
        Self {
            is_loading: false,
            ..self.clone()
        }
    }

    /// True once loading finished with nothing to show; views render "nothing found".
    pub fn is_empty(&self) -> bool {
        !self.is_loading && self.items.is_empty()
    }
}

pub struct CatalogLoader {
    source: Arc<dyn CatalogSource>,
    cache: Arc<CacheService>,
    state: StateCell<CatalogState>,
    sequence: RequestSequence,
    fallback: Option<CatalogListing>,
}

impl CatalogLoader {
    pub fn new(source: Arc<dyn CatalogSource>, cache: Arc<CacheService>) -> Self {
        Self {
            source,
            cache,
            state: StateCell::new(CatalogState::loading()),
            sequence: RequestSequence::new(),
            fallback: None,
        }
    }

    /// Bundled items installed when a refresh fails and nothing else is available.
    pub fn with_fallback(mut self, items: Vec<CatalogItem>) -> Self {
        let fallback_count = self.cache.config().featured_fallback_count;
        self.fallback =
            (!items.is_empty()).then(|| CatalogListing::from_items(items, fallback_count));
        self
    }

    /// Constructs a loader and seeds it from the durable cache.
    pub fn mount(source: Arc<dyn CatalogSource>, cache: Arc<CacheService>) -> Self {
        let loader = Self::new(source, cache);
        loader.load_from_cache();
        loader
    }

    pub fn state(&self) -> Arc<CatalogState> {
        self.state.snapshot()
    }

    /// Phase one: installs a valid cached listing, if any, without suspending.
    pub fn load_from_cache(&self) -> Option<Arc<CatalogState>> {
        let listing = self.cache.catalog().read()?;
        debug!(items = listing.items.len(), "Catalog seeded from cache");
        Some(self.state.replace(CatalogState::ready(listing)))
    }

    /// Phase two: fetches the remote catalog.
    ///
    /// On success the listing replaces state and is written back to the cache within the
    /// same critical section as the sequence check. On failure state keeps its previous
    /// contents (or the fallback listing when empty) and stops loading. A response that
    /// arrives after a newer request was issued is discarded.
    pub async fn refresh(&self) -> Result<Arc<CatalogState>, RefreshError> {
        let ticket = self.sequence.issue();
        let started = Instant::now();
        let outcome = self.source.fetch_items().await;
        histogram!(METRIC_REFRESH_MS, "resource" => RESOURCE)
            .record(started.elapsed().as_secs_f64() * 1000.0);

        let superseded = || {
            counter!(METRIC_REFRESH_DISCARDED, "resource" => RESOURCE).increment(1);
            RefreshError::Superseded {
                resource: RESOURCE,
                sequence: ticket.value(),
                latest: self.sequence.latest(),
            }
        };

        match outcome {
            Ok(records) => {
                let items: Vec<CatalogItem> = records.into_iter().map(CatalogItem::from).collect();
                let listing =
                    CatalogListing::from_items(items, self.cache.config().featured_fallback_count);

                // The durable write shares the state lock so a superseded response can
                // never land in the cache after a newer one.
                let applied = self.state.replace_with(|_| {
                    if !self.sequence.is_latest(ticket) {
                        return None;
                    }
                    self.cache.catalog().write(&listing);
                    Some(CatalogState::ready(listing.clone()))
                });
                let Some(state) = applied else {
                    return Err(superseded());
                };

                info!(
                    items = state.items.len(),
                    featured = state.featured_items.len(),
                    sequence = ticket.value(),
                    "Catalog refreshed"
                );
                Ok(state)
            }
            Err(source) => {
                let applied = self.state.replace_with(|current| {
                    if !self.sequence.is_latest(ticket) {
                        return None;
                    }
                    match &self.fallback {
                        Some(fallback) if current.items.is_empty() => {
                            Some(CatalogState::ready(fallback.clone()))
                        }
                        _ => Some(current.settled()),
                    }
                });
                if applied.is_none() {
                    return Err(superseded());
                }
                Err(RefreshError::Source {
                    resource: RESOURCE,
                    source,
                })
            }
        }
    }

    /// Runs [`refresh`](Self::refresh), logging instead of returning failures.
    pub async fn revalidate(&self) -> Arc<CatalogState> {
        match self.refresh().await {
            Ok(state) => state,
            Err(err) if err.is_superseded() => {
                debug!(error = %err, "Catalog response superseded");
                self.state()
            }
            Err(err) => {
                warn!(error = %err, "Catalog refresh failed; keeping cached state");
                self.state()
            }
        }
    }
}
