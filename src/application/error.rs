use thiserror::Error;

use crate::{application::repos::SourceError, config::LoadError, infra::error::InfraError};

/// Why a background refresh did not update loader state.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("{resource} refresh failed: {source}")]
    Source {
        resource: &'static str,
        #[source]
        source: SourceError,
    },
    #[error("{resource} response #{sequence} discarded; request #{latest} superseded it")]
    Superseded {
        resource: &'static str,
        sequence: u64,
        latest: u64,
    },
}

impl RefreshError {
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. })
    }
}

/// Top-level error for the command-line entry point.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
