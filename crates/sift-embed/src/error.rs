use sift_core::DimensionMismatch;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("text is empty after normalization")]
    EmptyText,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned status {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} response could not be decoded: {reason}")]
    Decode {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} needs {setting} but none is configured")]
    MissingSetting {
        provider: &'static str,
        setting: &'static str,
    },

    #[error("embedding request pool is closed")]
    PoolClosed,

    #[error(transparent)]
    Dimension(#[from] DimensionMismatch),
}

impl EmbeddingError {
    /// The provider returned vectors of the wrong length. Unlike every other
    /// variant this is not a property of the input.
    #[must_use]
    pub fn dimension_mismatch(&self) -> Option<DimensionMismatch> {
        match self {
            Self::Dimension(m) => Some(*m),
            _ => None,
        }
    }
}
