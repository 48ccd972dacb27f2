use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {0} is empty")]
    Empty(String),

    #[error("failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("missing required config key: {0}")]
    MissingKey(String),

    #[error("invalid value for config key {key}: {reason}")]
    Invalid { key: String, reason: String },

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// A batch record that cannot be turned into an [`Item`](crate::Item).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("record {position} has an empty title")]
    EmptyTitle { position: usize },

    #[error("record {position} belongs to category '{found}', expected '{expected}'")]
    CategoryMismatch {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("record {position} was fetched on {found}, expected {expected}")]
    DateMismatch {
        position: usize,
        expected: String,
        found: String,
    },
}

/// Two embedding vectors (or a vector and the configured dimension) differ
/// in length.
///
/// This is an internal invariant violation, never a property of bad input,
/// so callers treat it as fatal to the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("embedding dimension mismatch: expected {expected}, got {actual}")]
pub struct DimensionMismatch {
    pub expected: usize,
    pub actual: usize,
}
