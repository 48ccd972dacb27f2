//! Run configuration: a YAML file for behavior, environment variables for
//! provider credentials.
//!
//! Nothing that changes clustering outcomes has a default. The similarity
//! threshold, embedding provider, model, dimension, and the request
//! concurrency cap must all be present in the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::ConfigError;

const DEFAULT_MAX_CONCURRENT_CATEGORIES: usize = 1;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 1_000;

/// Cosine similarity at or above which two items are duplicates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold(f32);

impl Threshold {
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] unless `value` is finite and in `(0, 1]`.
    pub fn new(value: f32) -> Result<Self, ConfigError> {
        if value.is_finite() && value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(ConfigError::Invalid {
                key: "deduplication.similarity-threshold".to_string(),
                reason: format!("{value} is outside (0, 1]"),
            })
        }
    }

    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }
}

/// Embedding backend selected by `embedding.provider`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    VoyageAi,
    Gemini,
    Tei,
    Hashing,
}

impl ProviderKind {
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an unknown provider name.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "voyageai" | "voyage" => Ok(Self::VoyageAi),
            "gemini" => Ok(Self::Gemini),
            "tei" | "sentence-transformers" => Ok(Self::Tei),
            "hashing" => Ok(Self::Hashing),
            other => Err(ConfigError::Invalid {
                key: "embedding.provider".to_string(),
                reason: format!(
                    "unsupported provider '{other}'; expected one of openai, voyageai, gemini, tei, hashing"
                ),
            }),
        }
    }

    /// Environment variable holding the provider's API key, if it needs one.
    #[must_use]
    pub fn credential_env_var(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::VoyageAi => Some("VOYAGEAI_API_KEY"),
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::Tei | Self::Hashing => None,
        }
    }

    #[must_use]
    pub fn default_base_url(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("https://api.openai.com"),
            Self::VoyageAi => Some("https://api.voyageai.com"),
            Self::Gemini => Some("https://generativelanguage.googleapis.com"),
            Self::Tei | Self::Hashing => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::VoyageAi => write!(f, "voyageai"),
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::Tei => write!(f, "tei"),
            ProviderKind::Hashing => write!(f, "hashing"),
        }
    }
}

#[derive(Clone)]
pub struct EmbeddingSettings {
    pub provider: ProviderKind,
    pub model: String,
    pub dimension: usize,
    pub max_concurrent_requests: usize,
    /// Provider base URL; `None` only for the offline hashing backend.
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl std::fmt::Debug for EmbeddingSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingSettings")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub archive_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub max_concurrent_categories: usize,
    pub run_timeout_secs: Option<u64>,
}

/// Validated configuration for one `sift` process.
#[derive(Debug, Clone)]
pub struct DedupConfig {
    pub threshold: Threshold,
    pub pipeline: PipelineSettings,
    pub embedding: EmbeddingSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    deduplication: Option<RawDeduplication>,
    embedding: Option<RawEmbedding>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawDeduplication {
    similarity_threshold: Option<f32>,
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    archive_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    max_concurrent_categories: Option<usize>,
    run_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawEmbedding {
    provider: Option<String>,
    model: Option<String>,
    dimension: Option<usize>,
    max_concurrent_requests: Option<usize>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_backoff_ms: Option<u64>,
}

/// Load configuration from `path`, reading `.env` first for credentials.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file is missing, empty, malformed, lacks a
/// required key, or the provider's credential variable is not set.
pub fn load_config(path: &Path) -> Result<DedupConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_config_from_env(path)
}

/// Like [`load_config`] but without loading `.env` files.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_from_env(path: &Path) -> Result<DedupConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    if content.trim().is_empty() {
        return Err(ConfigError::Empty(path.display().to_string()));
    }
    parse_config(&content, |key| std::env::var(key))
}

/// Parse and validate configuration YAML, resolving credentials through
/// `lookup` so callers (and tests) control where they come from.
///
/// # Errors
///
/// Returns [`ConfigError`] for malformed YAML, missing or invalid keys, and
/// missing credentials.
pub fn parse_config<F>(yaml: &str, lookup: F) -> Result<DedupConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let raw: RawConfig = serde_yaml::from_str(yaml)?;
    build_config(raw, lookup)
}

fn build_config<F>(raw: RawConfig, lookup: F) -> Result<DedupConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let dedup = raw
        .deduplication
        .ok_or_else(|| ConfigError::MissingKey("deduplication".to_string()))?;
    let emb = raw
        .embedding
        .ok_or_else(|| ConfigError::MissingKey("embedding".to_string()))?;

    let threshold = Threshold::new(require(
        dedup.similarity_threshold,
        "deduplication.similarity-threshold",
    )?)?;

    let max_concurrent_categories = positive(
        dedup
            .max_concurrent_categories
            .unwrap_or(DEFAULT_MAX_CONCURRENT_CATEGORIES),
        "deduplication.max-concurrent-categories",
    )?;

    let pipeline = PipelineSettings {
        input_dir: require(dedup.input_dir, "deduplication.input-dir")?,
        output_dir: require(dedup.output_dir, "deduplication.output-dir")?,
        archive_dir: dedup.archive_dir,
        log_dir: dedup.log_dir,
        max_concurrent_categories,
        run_timeout_secs: dedup.run_timeout_secs.filter(|&secs| secs > 0),
    };

    let provider = ProviderKind::parse(&require(emb.provider, "embedding.provider")?)?;
    let model = require(emb.model, "embedding.model")?;
    if model.trim().is_empty() {
        return Err(ConfigError::Invalid {
            key: "embedding.model".to_string(),
            reason: "must be non-empty".to_string(),
        });
    }
    let dimension = positive(require(emb.dimension, "embedding.dimension")?, "embedding.dimension")?;
    let max_concurrent_requests = positive(
        require(emb.max_concurrent_requests, "embedding.max-concurrent-requests")?,
        "embedding.max-concurrent-requests",
    )?;

    let base_url = match (emb.base_url, provider) {
        (_, ProviderKind::Hashing) => None,
        (Some(url), _) => Some(url.trim_end_matches('/').to_string()),
        (None, ProviderKind::Tei) => return Err(ConfigError::MissingKey("embedding.base-url".to_string())),
        (None, kind) => kind.default_base_url().map(str::to_string),
    };

    let api_key = match provider.credential_env_var() {
        Some(var) => Some(
            lookup(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))?,
        ),
        None => None,
    };

    let embedding = EmbeddingSettings {
        provider,
        model,
        dimension,
        max_concurrent_requests,
        base_url,
        api_key,
        timeout_secs: emb.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        max_retries: emb.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
        retry_backoff_ms: emb.retry_backoff_ms.unwrap_or(DEFAULT_RETRY_BACKOFF_MS),
    };

    Ok(DedupConfig {
        threshold,
        pipeline,
        embedding,
    })
}

fn require<T>(value: Option<T>, key: &str) -> Result<T, ConfigError> {
    value.ok_or_else(|| ConfigError::MissingKey(key.to_string()))
}

fn positive(value: usize, key: &str) -> Result<usize, ConfigError> {
    if value == 0 {
        Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: "must be greater than zero".to_string(),
        })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
