use std::future::Future;

use sift_core::{EmbeddingSettings, ProviderKind};

use crate::error::EmbeddingError;
use crate::providers::gemini::GeminiClient;
use crate::providers::hashing::HashingEmbedder;
use crate::providers::openai::OpenAiClient;
use crate::providers::tei::TeiClient;
use crate::providers::voyage::VoyageClient;
use crate::providers::{build_client, require_base_url, require_key};

/// One raw embedding call against a provider. No retries, caching, or
/// dimension checks happen at this level; see [`crate::Embedder`].
pub trait Embed: Send + Sync {
    /// Short provider name used in logs and errors.
    fn name(&self) -> &'static str;

    fn embed_text(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Vec<f32>, EmbeddingError>> + Send;
}

/// Provider selected by configuration.
#[derive(Debug, Clone)]
pub enum Backend {
    OpenAi(OpenAiClient),
    VoyageAi(VoyageClient),
    Gemini(GeminiClient),
    Tei(TeiClient),
    Hashing(HashingEmbedder),
}

impl Backend {
    /// Build the backend named by `settings.provider`.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::MissingSetting`] when a network provider has
    /// no base URL or API key, or [`EmbeddingError::Http`] if the HTTP client
    /// fails to build.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self, EmbeddingError> {
        if settings.provider == ProviderKind::Hashing {
            return Ok(Self::Hashing(HashingEmbedder::new(settings.dimension)));
        }

        let client = build_client(settings.timeout_secs)?;
        let base_url = settings.base_url.as_deref();
        let api_key = settings.api_key.as_deref();
        let model = settings.model.as_str();

        let backend = match settings.provider {
            ProviderKind::OpenAi => Self::OpenAi(OpenAiClient::new(
                client,
                &require_base_url("openai", base_url)?,
                model,
                require_key("openai", api_key)?,
            )),
            ProviderKind::VoyageAi => Self::VoyageAi(VoyageClient::new(
                client,
                &require_base_url("voyageai", base_url)?,
                model,
                require_key("voyageai", api_key)?,
            )),
            ProviderKind::Gemini => Self::Gemini(GeminiClient::new(
                client,
                &require_base_url("gemini", base_url)?,
                model,
                require_key("gemini", api_key)?,
            )),
            ProviderKind::Tei => Self::Tei(TeiClient::new(client, &require_base_url("tei", base_url)?)),
            ProviderKind::Hashing => Self::Hashing(HashingEmbedder::new(settings.dimension)),
        };
        Ok(backend)
    }
}

impl Embed for Backend {
    fn name(&self) -> &'static str {
        match self {
            Self::OpenAi(_) => "openai",
            Self::VoyageAi(_) => "voyageai",
            Self::Gemini(_) => "gemini",
            Self::Tei(_) => "tei",
            Self::Hashing(_) => "hashing",
        }
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match self {
            Self::OpenAi(c) => c.embed(text).await,
            Self::VoyageAi(c) => c.embed(text).await,
            Self::Gemini(c) => c.embed(text).await,
            Self::Tei(c) => c.embed(text).await,
            Self::Hashing(h) => h.embed(text),
        }
    }
}
