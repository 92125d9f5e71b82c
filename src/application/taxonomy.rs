//! Stale-while-revalidate taxonomy loader.
//!
//! Same two-phase protocol as the catalog loader. A successful refresh also persists the
//! flattened name to variant index so later processes can resolve themes before any
//! network round trip.

use std::{sync::Arc, time::Instant};

use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::application::catalog::{METRIC_REFRESH_DISCARDED, METRIC_REFRESH_MS};
use crate::application::error::RefreshError;
use crate::application::repos::CatalogSource;
use crate::application::state::{RequestSequence, StateCell};
use crate::cache::CacheService;
use crate::domain::taxonomy::{self, TaxonomyNode};

const RESOURCE: &str = "taxonomy";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxonomyState {
    /// Genre names in tree order.
    pub names: Vec<String>,
    pub tree: Vec<TaxonomyNode>,
    pub is_loading: bool,
}

impl TaxonomyState {
    fn loading() -> Self {
        Self {
            names: Vec::new(),
            tree: Vec::new(),
            is_loading: true,
        }
    }

    fn ready(tree: Vec<TaxonomyNode>) -> Self {
        Self {
            names: taxonomy::genre_names(&tree),
            tree,
            is_loading: false,
        }
    }

    /// Looks a node up by name among genres, then subgroups.
    pub fn find(&self, name: &str) -> Option<&TaxonomyNode> {
        taxonomy::find_node(&self.tree, name)
    }
}

pub struct TaxonomyLoader {
    source: Arc<dyn CatalogSource>,
    cache: Arc<CacheService>,
    state: StateCell<TaxonomyState>,
    sequence: RequestSequence,
}

impl TaxonomyLoader {
    pub fn new(source: Arc<dyn CatalogSource>, cache: Arc<CacheService>) -> Self {
        Self {
            source,
            cache,
            state: StateCell::new(TaxonomyState::loading()),
            sequence: RequestSequence::new(),
        }
    }

    pub fn mount(source: Arc<dyn CatalogSource>, cache: Arc<CacheService>) -> Self {
        let loader = Self::new(source, cache);
        loader.load_from_cache();
        loader
    }

    pub fn state(&self) -> Arc<TaxonomyState> {
        self.state.snapshot()
    }

    pub fn load_from_cache(&self) -> Option<Arc<TaxonomyState>> {
        let tree = self.cache.taxonomy().read()?;
        debug!(genres = tree.len(), "Taxonomy seeded from cache");
        Some(self.state.replace(TaxonomyState::ready(tree)))
    }

    pub async fn refresh(&self) -> Result<Arc<TaxonomyState>, RefreshError> {
        let ticket = self.sequence.issue();
        let started = Instant::now();
        let outcome = self.source.fetch_taxonomy().await;
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
                let built = taxonomy::build(&records);
                // Tree and index are persisted under the state lock, after the sequence
                // check, so overlapping refreshes cannot interleave their writes.
                let applied = self.state.replace_with(|_| {
                    if !self.sequence.is_latest(ticket) {
                        return None;
                    }
                    self.cache.taxonomy().write(&built.tree);
                    self.cache.variant_index().write(&built.index);
                    Some(TaxonomyState::ready(built.tree.clone()))
                });
                let Some(state) = applied else {
                    return Err(superseded());
                };

                info!(
                    genres = state.names.len(),
                    indexed = built.index.len(),
                    sequence = ticket.value(),
                    "Taxonomy refreshed"
                );
                Ok(state)
            }
            Err(source) => {
                let applied = self.state.replace_with(|current| {
                    self.sequence.is_latest(ticket).then(|| TaxonomyState {
                        is_loading: false,
                        ..current.clone()
                    })
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

    pub async fn revalidate(&self) -> Arc<TaxonomyState> {
        match self.refresh().await {
            Ok(state) => state,
            Err(err) if err.is_superseded() => {
                debug!(error = %err, "Taxonomy response superseded");
                self.state()
            }
            Err(err) => {
                warn!(error = %err, "Taxonomy refresh failed; keeping cached state");
                self.state()
            }
        }
    }
}
