//! Offline feature-hashing embedder.
//!
//! Hashes word unigrams and bigrams into a fixed number of buckets with a
//! sign bit, then L2-normalizes. Lexically close texts land close together,
//! which is enough for local runs and tests without a provider account.

use sha2::{Digest, Sha256};

use crate::error::EmbeddingError;

const BIGRAM_WEIGHT: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// # Errors
    ///
    /// Returns [`EmbeddingError::EmptyText`] if `text` has no word tokens.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() || self.dimension == 0 {
            return Err(EmbeddingError::EmptyText);
        }

        let mut values = vec![0.0_f32; self.dimension];
        for token in &tokens {
            self.accumulate(&mut values, token, 1.0);
        }
        for pair in tokens.windows(2) {
            self.accumulate(&mut values, &format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
        }

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut values {
                *v /= norm;
            }
        }
        Ok(values)
    }

    fn accumulate(&self, values: &mut [f32], feature: &str, weight: f32) {
        let hash = Sha256::digest(feature.as_bytes());
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&hash[..8]);
        #[allow(clippy::cast_possible_truncation)]
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
        let sign = if hash[8] & 1 == 0 { 1.0 } else { -1.0 };
        values[bucket] += sign * weight;
    }
}
