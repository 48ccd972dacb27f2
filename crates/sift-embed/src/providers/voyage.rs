//! Voyage AI embeddings client.

use serde::Serialize;

use super::openai::EmbeddingsResponse;
use super::send_json;
use crate::error::EmbeddingError;

const PROVIDER: &str = "voyageai";

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
    input_type: &'static str,
}

#[derive(Clone)]
pub struct VoyageClient {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
}

impl std::fmt::Debug for VoyageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoyageClient")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl VoyageClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, model: &str, api_key: String) -> Self {
        Self {
            client,
            url: format!("{}/v1/embeddings", base_url.trim_end_matches('/')),
            model: model.to_string(),
            api_key,
        }
    }

    /// # Errors
    ///
    /// Returns [`EmbeddingError`] on network failure, non-2xx status, or a
    /// response without embeddings.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingsRequest {
                model: &self.model,
                input: [text],
                input_type: "document",
            });
        let response: EmbeddingsResponse = send_json(PROVIDER, request).await?;
        response.into_first(PROVIDER)
    }
}
