//! `OpenAI` embeddings API client (`POST /v1/embeddings`).

use serde::{Deserialize, Serialize};

use super::send_json;
use crate::error::EmbeddingError;

const PROVIDER: &str = "openai";

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

impl EmbeddingsResponse {
    /// First vector in `data`. The Voyage API shares this response shape.
    pub(crate) fn into_first(self, provider: &'static str) -> Result<Vec<f32>, EmbeddingError> {
        self.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::Decode {
                provider,
                reason: "response contained no embeddings".to_string(),
            })
    }
}

#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
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
                input: text,
            });
        let response: EmbeddingsResponse = send_json(PROVIDER, request).await?;
        response.into_first(PROVIDER)
    }
}
