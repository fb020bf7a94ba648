//! Triangulation Library
//!
//! Publishes one trustworthy summary per topic of an electoral race by
//! having several LLMs summarize it independently and arbitrating between
//! their answers.
//!
//! # Features
//!
//! ## Arbitration
//! - Text similarity: blended sequence ratio, word Jaccard and bigram Jaccard
//! - Consensus grouping: greedy single-link at the moderate-agreement threshold
//! - Confidence: weighted self-confidence, internal agreement and loaded-term bias
//! - Fallback to the most reliable model when nobody agrees
//!
//! ## Race coordination
//! - One arbitration per topic: race overview, each candidate, each canonical issue
//! - Concurrent summary gathering with per-provider timeout and retry
//! - Partial results: a failing provider or topic never sinks the race
//!
//! # Usage
//!
//! ```bash
//! # Arbitrate one topic's summaries from a JSON array
//! triangulate arbitrate --input summaries.json
//!
//! # Arbitrate a whole race bundle
//! triangulate race --input race.json --config triangulation.toml
//!
//! # Inspect the similarity of two texts
//! triangulate similarity "text a" "text b"
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod council;
pub mod ensemble;
pub mod summary;
pub mod topic;

// Re-export key config types
pub use config::{ArbitrationConfig, ConfigError, ConfigResult, SharedArbitrationConfig};

// Re-export key arbitration types
pub use ensemble::{
    ArbitrationEngine, RaceCoordinator, RaceTriangulation, SharedArbitrationEngine,
    TextSimilarityScorer, TopicResult, TopicSummaries,
};

// Re-export key summary types
pub use summary::{
    ConfidenceLevel, ContributingResponse, ModelId, Resolution, Summary, TriangulatedResult,
};

// Re-export key council types
pub use council::{
    gather_summaries, GatherOutcome, ProviderError, ProviderFailure, SharedSummaryProvider,
    SummaryProvider, SummaryRequest,
};

// Re-export topic types
pub use topic::{CanonicalIssue, Topic};
