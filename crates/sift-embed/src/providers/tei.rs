//! TEI (Text Embeddings Inference) client.
//!
//! Also serves self-hosted sentence-transformers models, which TEI exposes
//! behind the same `/embed` route.

use serde::Serialize;

use super::send_json;
use crate::error::EmbeddingError;

const PROVIDER: &str = "tei";

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Clone)]
pub struct TeiClient {
    client: reqwest::Client,
    url: String,
}

impl TeiClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}/embed", base_url.trim_end_matches('/')),
        }
    }

    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError`] on network failure, non-2xx status, or an
    /// empty response.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = self.client.post(&self.url).json(&EmbedRequest { inputs: text });
        let embeddings: Vec<Vec<f32>> = send_json(PROVIDER, request).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Decode {
                provider: PROVIDER,
                reason: "TEI returned an empty embedding list".to_string(),
            })
    }
}
