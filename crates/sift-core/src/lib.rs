//! Shared data model, text normalization, and configuration for `sift`.
//!
//! Every other crate in the workspace depends on these types: the batch
//! `Item` arena, the `EmbeddingVector` newtype, the `CategoryOutput` wire
//! contract, and the validated `DedupConfig`.

pub mod config;
pub mod error;
pub mod item;
pub mod normalize;
pub mod output;
pub mod vector;

pub use config::{
    load_config, load_config_from_env, parse_config, DedupConfig, EmbeddingSettings, PipelineSettings,
    ProviderKind, Threshold,
};
pub use error::{BatchError, ConfigError, DimensionMismatch};
pub use item::{canonical_link, parse_feed_date, Batch, Item, ItemRecord};
pub use normalize::{embedding_text, normalize_text};
pub use output::{ArticleRef, CategoryOutput};
pub use vector::EmbeddingVector;
