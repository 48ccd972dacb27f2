//! Retry with exponential back-off and jitter for embedding providers.
//!
//! [`retry_with_backoff`] retries transient failures (network errors, 429,
//! 5xx). Everything else, including empty input, malformed responses, and
//! dimension mismatches, is returned on the first failure.

use std::future::Future;
use std::time::Duration;

use crate::error::EmbeddingError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** timeouts, connection failures, HTTP 429 and 5xx.
///
/// **Not retriable:** [`EmbeddingError::EmptyText`],
/// [`EmbeddingError::Decode`], [`EmbeddingError::MissingSetting`],
/// [`EmbeddingError::PoolClosed`], [`EmbeddingError::Dimension`], and any
/// other 4xx.
pub(crate) fn is_retriable(err: &EmbeddingError) -> bool {
    match err {
        EmbeddingError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        EmbeddingError::Status { status, .. } => *status == 429 || *status >= 500,
        EmbeddingError::EmptyText
        | EmbeddingError::Decode { .. }
        | EmbeddingError::MissingSetting { .. }
        | EmbeddingError::PoolClosed
        | EmbeddingError::Dimension(_) => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Attempt | Sleep before next attempt        |
/// |---------|----------------------------------|
/// | 1       | 1 000 ms × 2⁰ ± 25 % jitter     |
/// | 2       | 1 000 ms × 2¹ ± 25 % jitter     |
/// | 3       | 1 000 ms × 2² ± 25 % jitter     |
///
/// Delay is capped at 60 s. Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    provider: &'static str,
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, EmbeddingError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EmbeddingError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    provider,
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "embedding request failed, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
