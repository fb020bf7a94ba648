//! Race coordinator - per-topic gathering and parallel arbitration
//!
//! A race is arbitrated once per topic (overview, each candidate, each
//! canonical issue). Topics are independent: summaries for all of them are
//! gathered concurrently, and each topic is arbitrated on the blocking pool
//! since arbitration is CPU-bound. A failure in one topic's task becomes a
//! LOW-confidence error result for that topic only.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};
use uuid::Uuid;

use super::arbitration::SharedArbitrationEngine;
use crate::council::{gather_summaries, ProviderFailure, SharedSummaryProvider, SummaryRequest};
use crate::summary::{ConfidenceLevel, Summary, TriangulatedResult};
use crate::topic::Topic;

/// Error type for coordinator operations
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("Arbitration task for {topic} panicked: {message}")]
    TaskPanicked { topic: String, message: String },

    #[error("Arbitration task for {topic} was cancelled")]
    TaskCancelled { topic: String },
}

/// Result type for coordinator operations
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

impl CoordinatorError {
    fn from_join(topic: &Topic, err: JoinError) -> Self {
        if err.is_panic() {
            let payload = err.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            CoordinatorError::TaskPanicked {
                topic: topic.to_string(),
                message,
            }
        } else {
            CoordinatorError::TaskCancelled {
                topic: topic.to_string(),
            }
        }
    }
}

/// Summaries already collected for one topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSummaries {
    pub topic: Topic,
    #[serde(default)]
    pub summaries: Vec<Summary>,
}

/// Arbitrated result for one topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicResult {
    pub topic: Topic,
    pub result: TriangulatedResult,
}

/// Every topic's result for one race
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceTriangulation {
    pub run_id: Uuid,
    pub race_id: String,
    pub generated_at: DateTime<Utc>,
    /// Results in topic order
    pub topics: Vec<TopicResult>,
    /// Providers that delivered nothing, per topic
    #[serde(default)]
    pub provider_failures: Vec<ProviderFailure>,
}

impl RaceTriangulation {
    fn new(
        race_id: &str,
        topics: Vec<TopicResult>,
        provider_failures: Vec<ProviderFailure>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            race_id: race_id.to_string(),
            generated_at: Utc::now(),
            topics,
            provider_failures,
        }
    }

    /// Result for a topic, if it was arbitrated
    pub fn get(&self, topic: &Topic) -> Option<&TriangulatedResult> {
        self.topics
            .iter()
            .find(|t| &t.topic == topic)
            .map(|t| &t.result)
    }

    /// Topics whose result downstream consumers should treat skeptically
    pub fn low_confidence_topics(&self) -> Vec<&Topic> {
        self.topics
            .iter()
            .filter(|t| t.result.confidence == ConfidenceLevel::Low)
            .map(|t| &t.topic)
            .collect()
    }

    /// Share of topics resolved by multi-model consensus
    pub fn consensus_rate(&self) -> f64 {
        if self.topics.is_empty() {
            return 0.0;
        }
        let agreed = self
            .topics
            .iter()
            .filter(|t| t.result.is_consensus())
            .count();
        agreed as f64 / self.topics.len() as f64
    }
}

/// Runs gathering and arbitration for every topic of a race
pub struct RaceCoordinator {
    engine: SharedArbitrationEngine,
    providers: Vec<SharedSummaryProvider>,
}

impl RaceCoordinator {
    pub fn new(engine: SharedArbitrationEngine, providers: Vec<SharedSummaryProvider>) -> Self {
        Self { engine, providers }
    }

    /// Coordinator over already-collected summaries
    pub fn offline(engine: SharedArbitrationEngine) -> Self {
        Self::new(engine, Vec::new())
    }

    /// Gather and arbitrate the overview, every candidate and every canonical issue
    pub async fn triangulate_race(
        &self,
        race_id: &str,
        candidates: &[String],
        context: &str,
    ) -> RaceTriangulation {
        let topics = Topic::for_race(candidates);
        let gather_config = &self.engine.config().gather;

        info!(
            race_id,
            topics = topics.len(),
            providers = self.providers.len(),
            "Gathering race summaries"
        );

        let gathered = join_all(topics.into_iter().map(|topic| async move {
            let request = SummaryRequest {
                race_id: race_id.to_string(),
                topic,
                context: context.to_string(),
            };
            let outcome = gather_summaries(&self.providers, &request, gather_config).await;
            (request.topic, outcome)
        }))
        .await;

        let mut batches = Vec::with_capacity(gathered.len());
        let mut failures = Vec::new();
        for (topic, outcome) in gathered {
            failures.extend(outcome.failures);
            batches.push(TopicSummaries {
                topic,
                summaries: outcome.summaries,
            });
        }

        let results = self.arbitrate_all(batches).await;
        RaceTriangulation::new(race_id, results, failures)
    }

    /// Arbitrate pre-collected summaries, one task per topic
    pub async fn arbitrate_topics(
        &self,
        race_id: &str,
        batches: Vec<TopicSummaries>,
    ) -> RaceTriangulation {
        let results = self.arbitrate_all(batches).await;
        RaceTriangulation::new(race_id, results, Vec::new())
    }

    async fn arbitrate_all(&self, batches: Vec<TopicSummaries>) -> Vec<TopicResult> {
        let tasks: Vec<_> = batches
            .into_iter()
            .map(|batch| {
                let engine = Arc::clone(&self.engine);
                let topic = batch.topic.clone();
                let summaries = batch.summaries;
                let handle = tokio::task::spawn_blocking(move || engine.arbitrate(&summaries));
                (topic, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(tasks.len());
        for (topic, handle) in tasks {
            let result = match join_topic(&topic, handle).await {
                Ok(result) => result,
                Err(e) => {
                    error!(topic = %topic, error = %e, "Arbitration task failed");
                    TriangulatedResult::error(format!("Arbitration failed: {}", e))
                }
            };
            results.push(TopicResult { topic, result });
        }

        results
    }
}

/// Wait for one topic's arbitration task
async fn join_topic(
    topic: &Topic,
    handle: JoinHandle<TriangulatedResult>,
) -> CoordinatorResult<TriangulatedResult> {
    handle
        .await
        .map_err(|e| CoordinatorError::from_join(topic, e))
}
