//! Model council: collecting summaries from several providers
//!
//! Each configured model is a [`SummaryProvider`]. Gathering queries all of
//! them concurrently and keeps whatever succeeds: a provider that errors,
//! times out or returns blank text is recorded as a [`ProviderFailure`] and
//! simply contributes no summary. Arbitration then runs on the 0..N
//! summaries that came back.
//!
//! ```text
//! gather_summaries
//!   ├─ provider A ──timeout/retry──▶ Ok(Summary)
//!   ├─ provider B ──timeout/retry──▶ Err  → ProviderFailure
//!   └─ provider C ──timeout/retry──▶ Ok(Summary)
//!                                      ▼
//!                          GatherOutcome { summaries: [A, C], failures: [B] }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GatherConfig;
use crate::summary::{ModelId, Summary};
use crate::topic::Topic;

/// Errors from a single provider call
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Provider returned an empty summary")]
    EmptyResponse,
}

impl ProviderError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ProviderError::Unavailable(_))
    }
}

/// What a provider is asked to summarize
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub race_id: String,
    pub topic: Topic,
    /// Extracted source material for the topic
    pub context: String,
}

/// A model that can summarize a topic
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    /// Model id used for reliability weighting
    fn model(&self) -> &str;

    /// Produce one summary for the request
    async fn summarize(&self, request: &SummaryRequest) -> Result<Summary, ProviderError>;

    /// Check if this provider can be queried at all
    async fn is_available(&self) -> bool {
        true
    }
}

/// Shared reference to a provider
pub type SharedSummaryProvider = Arc<dyn SummaryProvider>;

/// A provider that produced no summary for a topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub model: ModelId,
    pub topic: Topic,
    pub error: String,
    pub attempts: u32,
}

/// Summaries that arrived plus the providers that did not deliver
#[derive(Debug, Clone, Default)]
pub struct GatherOutcome {
    /// Successful summaries, in provider order
    pub summaries: Vec<Summary>,
    pub failures: Vec<ProviderFailure>,
}

/// Query every provider concurrently, keeping partial results
pub async fn gather_summaries(
    providers: &[SharedSummaryProvider],
    request: &SummaryRequest,
    config: &GatherConfig,
) -> GatherOutcome {
    let calls = providers
        .iter()
        .map(|p| query_with_retry(p.as_ref(), request, config));
    let results = join_all(calls).await;

    let mut outcome = GatherOutcome::default();
    for (provider, result) in providers.iter().zip(results) {
        match result {
            Ok(summary) => outcome.summaries.push(summary),
            Err((error, attempts)) => {
                warn!(
                    model = provider.model(),
                    topic = %request.topic,
                    attempts,
                    error = %error,
                    "Provider produced no summary"
                );
                outcome.failures.push(ProviderFailure {
                    model: provider.model().to_string(),
                    topic: request.topic.clone(),
                    error: error.to_string(),
                    attempts,
                });
            }
        }
    }

    debug!(
        topic = %request.topic,
        succeeded = outcome.summaries.len(),
        failed = outcome.failures.len(),
        "Gathered summaries"
    );

    outcome
}

/// Returns the summary, or the last error with the number of attempts made
async fn query_with_retry(
    provider: &dyn SummaryProvider,
    request: &SummaryRequest,
    config: &GatherConfig,
) -> Result<Summary, (ProviderError, u32)> {
    if !provider.is_available().await {
        let error = ProviderError::Unavailable(provider.model().to_string());
        return Err((error, 0));
    }

    let max_attempts = config.max_retries + 1;
    let mut attempts = 0;

    loop {
        attempts += 1;
        let attempt = tokio::time::timeout(config.timeout(), provider.summarize(request));
        let error = match attempt.await {
            Ok(Ok(summary)) if !summary.content.trim().is_empty() => return Ok(summary),
            Ok(Ok(_)) => ProviderError::EmptyResponse,
            Ok(Err(e)) => e,
            Err(_) => ProviderError::Timeout(config.timeout()),
        };

        debug!(
            model = provider.model(),
            attempt = attempts,
            error = %error,
            "Summary attempt failed"
        );

        if attempts >= max_attempts || !error.is_retryable() {
            return Err((error, attempts));
        }
    }
}
