//! HTTP clients for the supported embedding providers, plus the offline
//! hashing backend.

pub mod gemini;
pub mod hashing;
pub mod openai;
pub mod tei;
pub mod voyage;

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::EmbeddingError;

const USER_AGENT: &str = concat!("sift/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client with the configured per-request timeout.
///
/// # Errors
///
/// Returns [`EmbeddingError::Http`] if the underlying client fails to build.
pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client, EmbeddingError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Send `request` and decode a JSON body, turning non-2xx responses into
/// [`EmbeddingError::Status`] so the retry layer can classify them.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<T, EmbeddingError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(EmbeddingError::Status {
            provider,
            status: status.as_u16(),
            body: truncate(&body, 512),
        });
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| EmbeddingError::Decode {
        provider,
        reason: e.to_string(),
    })
}

pub(crate) fn require_key(
    provider: &'static str,
    api_key: Option<&str>,
) -> Result<String, EmbeddingError> {
    api_key
        .map(str::to_string)
        .ok_or(EmbeddingError::MissingSetting {
            provider,
            setting: "an API key",
        })
}

pub(crate) fn require_base_url(
    provider: &'static str,
    base_url: Option<&str>,
) -> Result<String, EmbeddingError> {
    base_url
        .map(|u| u.trim_end_matches('/').to_string())
        .ok_or(EmbeddingError::MissingSetting {
            provider,
            setting: "a base URL",
        })
}

fn truncate(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
