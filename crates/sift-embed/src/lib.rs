//! Text embedding for the dedup pipeline.
//!
//! [`Embedder`] wraps a provider [`Backend`] with normalization, an in-run
//! cache, a shared request-concurrency cap, retries, and a dimension check.
//! It is the only part of `sift` that talks to the network.

pub mod backend;
pub mod embedder;
pub mod error;
pub mod providers;

mod cache;
mod retry;

pub use backend::{Backend, Embed};
pub use embedder::Embedder;
pub use error::EmbeddingError;
