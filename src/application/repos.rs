//! Source traits describing the remote catalog store.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::catalog::ItemRecord;
use crate::domain::taxonomy::TaxonomyRecord;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("remote catalog unreachable: {0}")]
    Transport(String),
    #[error("remote catalog responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("remote catalog payload could not be decoded: {0}")]
    Decode(String),
    #[error("remote catalog unavailable: {0}")]
    Unavailable(String),
}

impl SourceError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Read-only view of the remote catalog.
///
/// Both calls are "select all"; filtering and sorting beyond the delivery order happen
/// client side.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// All items, newest first.
    async fn fetch_items(&self) -> Result<Vec<ItemRecord>, SourceError>;

    /// All taxonomy rows, in any order.
    async fn fetch_taxonomy(&self) -> Result<Vec<TaxonomyRecord>, SourceError>;
}
