use crate::error::DimensionMismatch;

/// Fixed-length embedding for one batch item.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    #[must_use]
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Wrap `values`, checking the length against the configured dimension.
    ///
    /// # Errors
    ///
    /// Returns [`DimensionMismatch`] when `values.len() != expected`.
    pub fn with_dimension(values: Vec<f32>, expected: usize) -> Result<Self, DimensionMismatch> {
        if values.len() == expected {
            Ok(Self(values))
        } else {
            Err(DimensionMismatch {
                expected,
                actual: values.len(),
            })
        }
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}
