use sift_core::{DimensionMismatch, EmbeddingVector, Item};

/// Undirected scored pair of arena indices, `a < b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityEdge {
    pub a: usize,
    pub b: usize,
    pub score: f32,
}

/// Cosine similarity, accumulated in `f64` and clamped to `[-1, 1]`.
///
/// Returns exactly `1.0` for a non-zero vector compared with itself and
/// `0.0` when either vector has zero magnitude.
///
/// # Errors
///
/// Returns [`DimensionMismatch`] if the vectors differ in length.
pub fn similarity(a: &EmbeddingVector, b: &EmbeddingVector) -> Result<f32, DimensionMismatch> {
    let (x, y) = (a.as_slice(), b.as_slice());
    if x.len() != y.len() {
        return Err(DimensionMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }

    let (mut dot, mut norm_x, mut norm_y) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (&p, &q) in x.iter().zip(y) {
        let (p, q) = (f64::from(p), f64::from(q));
        dot += p * q;
        norm_x += p * p;
        norm_y += q * q;
    }

    if norm_x == 0.0 || norm_y == 0.0 {
        return Ok(0.0);
    }
    if x == y {
        return Ok(1.0);
    }

    #[allow(clippy::cast_possible_truncation)]
    let score = (dot / (norm_x * norm_y).sqrt()).clamp(-1.0, 1.0) as f32;
    Ok(score)
}

/// Score every pair `i < j` in the batch.
///
/// Items sharing an identity key are exact duplicates and get a `1.0` edge
/// without consulting their vectors.
///
/// # Errors
///
/// Returns [`DimensionMismatch`] if any two vectors differ in length.
pub fn pairwise_edges(
    items: &[Item],
    vectors: &[EmbeddingVector],
) -> Result<Vec<SimilarityEdge>, DimensionMismatch> {
    debug_assert_eq!(items.len(), vectors.len(), "one vector per item");

    let n = items.len().min(vectors.len());
    let mut edges = Vec::with_capacity(n.saturating_mul(n.saturating_sub(1)) / 2);
    for a in 0..n {
        for b in (a + 1)..n {
            let score = if items[a].key == items[b].key {
                1.0
            } else {
                similarity(&vectors[a], &vectors[b])?
            };
            edges.push(SimilarityEdge { a, b, score });
        }
    }
    Ok(edges)
}
