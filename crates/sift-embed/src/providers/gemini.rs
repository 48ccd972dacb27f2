//! Google Gemini `embedContent` client.

use serde::{Deserialize, Serialize};

use super::send_json;
use crate::error::EmbeddingError;

const PROVIDER: &str = "gemini";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("url", &self.url)
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// `model` may be given with or without the `models/` prefix.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, model: &str, api_key: String) -> Self {
        let model = model.trim_start_matches("models/");
        Self {
            client,
            url: format!(
                "{}/v1beta/models/{model}:embedContent",
                base_url.trim_end_matches('/')
            ),
            api_key,
        }
    }

    /// # Errors
    ///
    /// Returns [`EmbeddingError`] on network failure, non-2xx status, or an
    /// undecodable response.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&EmbedContentRequest {
                content: Content {
                    parts: [Part { text }],
                },
                task_type: "RETRIEVAL_DOCUMENT",
            });
        let response: EmbedContentResponse = send_json(PROVIDER, request).await?;
        Ok(response.embedding.values)
    }
}
