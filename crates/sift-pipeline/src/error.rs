use chrono::NaiveDate;
use sift_core::{BatchError, DimensionMismatch};
use sift_embed::EmbeddingError;
use thiserror::Error;

use crate::state::CategoryState;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal category state transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: CategoryState,
    pub to: CategoryState,
}

/// Why one category did not produce output. Never aborts the run on its
/// own; see [`PipelineError`].
#[derive(Debug, Error)]
pub enum CategoryError {
    /// Missing or empty batch, or a batch file that describes another
    /// category or date.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("validation error: {0}")]
    Validation(#[from] BatchError),

    #[error("embedding failed for item {item_id}: {source}")]
    Embedding {
        item_id: String,
        #[source]
        source: EmbeddingError,
    },

    #[error(transparent)]
    Dimension(#[from] DimensionMismatch),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Transition(#[from] IllegalTransition),
}

impl CategoryError {
    /// The dimension mismatch behind this error, whether it surfaced from a
    /// provider response or from scoring.
    #[must_use]
    pub fn dimension_mismatch(&self) -> Option<DimensionMismatch> {
        match self {
            Self::Dimension(m) => Some(*m),
            Self::Embedding { source, .. } => source.dimension_mismatch(),
            _ => None,
        }
    }
}

/// Errors that end the whole run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("embedding dimension mismatch in category '{category}': {source}")]
    DimensionMismatch {
        category: String,
        #[source]
        source: DimensionMismatch,
    },

    #[error("failed to list categories for {date}: {source}")]
    Listing {
        date: NaiveDate,
        #[source]
        source: StoreError,
    },
}
