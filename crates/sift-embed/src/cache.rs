//! In-run embedding cache keyed by a SHA-256 digest of the normalized text.
//!
//! Lives only as long as one [`crate::Embedder`]; nothing is persisted.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use sha2::{Digest, Sha256};
use sift_core::EmbeddingVector;

pub(crate) type CacheKey = [u8; 32];

pub(crate) fn cache_key(normalized: &str) -> CacheKey {
    Sha256::digest(normalized.as_bytes()).into()
}

#[derive(Debug, Default)]
pub(crate) struct EmbeddingCache {
    entries: Mutex<HashMap<CacheKey, EmbeddingVector>>,
}

impl EmbeddingCache {
    pub(crate) fn get(&self, key: &CacheKey) -> Option<EmbeddingVector> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Store `vector` unless another task got there first, returning
    /// whichever vector is now cached. Identical text therefore always maps
    /// to one vector within a run.
    pub(crate) fn insert_or_get(&self, key: CacheKey, vector: EmbeddingVector) -> EmbeddingVector {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(vector)
            .clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
