use std::sync::Arc;

use sift_core::{normalize_text, EmbeddingSettings, EmbeddingVector};
use tokio::sync::Semaphore;

use crate::backend::Embed;
use crate::cache::{cache_key, EmbeddingCache};
use crate::error::EmbeddingError;
use crate::retry::retry_with_backoff;

/// Embeds item text through a provider backend.
///
/// Shared by every category in a run (wrap it in an `Arc`): the semaphore
/// is the provider's request pool and the cache spans categories.
#[derive(Debug)]
pub struct Embedder<B> {
    backend: B,
    dimension: usize,
    max_retries: u32,
    retry_backoff_ms: u64,
    permits: Arc<Semaphore>,
    cache: EmbeddingCache,
}

impl<B: Embed> Embedder<B> {
    #[must_use]
    pub fn new(backend: B, settings: &EmbeddingSettings) -> Self {
        Self {
            backend,
            dimension: settings.dimension,
            max_retries: settings.max_retries,
            retry_backoff_ms: settings.retry_backoff_ms,
            permits: Arc::new(Semaphore::new(settings.max_concurrent_requests)),
            cache: EmbeddingCache::default(),
        }
    }

    /// Configured vector length.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub fn provider(&self) -> &'static str {
        self.backend.name()
    }

    /// Number of distinct normalized texts embedded so far in this run.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Embed `text` after normalization.
    ///
    /// Identical normalized text always yields the same vector within one
    /// `Embedder`, whatever the provider returns on a second call.
    ///
    /// # Errors
    ///
    /// - [`EmbeddingError::EmptyText`] if nothing is left after normalization.
    /// - [`EmbeddingError::Dimension`] if the provider returns a vector of the
    ///   wrong length.
    /// - Any provider error that survives the retry policy.
    pub async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbeddingError> {
        let normalized = normalize_text(text);
        if normalized.is_empty() {
            return Err(EmbeddingError::EmptyText);
        }

        let key = cache_key(&normalized);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| EmbeddingError::PoolClosed)?;

        let provider = self.backend.name();
        let values = retry_with_backoff(provider, self.max_retries, self.retry_backoff_ms, || {
            self.backend.embed_text(&normalized)
        })
        .await?;
        let vector = EmbeddingVector::with_dimension(values, self.dimension)?;

        tracing::trace!(provider, chars = normalized.len(), "embedded text");
        Ok(self.cache.insert_or_get(key, vector))
    }
}
