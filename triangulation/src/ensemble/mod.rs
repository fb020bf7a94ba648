//! Multi-model consensus arbitration
//!
//! Several LLMs summarize the same topic of a race independently. This
//! module decides which summary to publish and how much to trust it.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     RaceCoordinator                        │
//! │  • Fans out one request per topic to the council           │
//! │  • Arbitrates each topic on the blocking pool              │
//! └─────────────────────────┬─────────────────────────────────┘
//!                           │ Vec<Summary> per topic
//!                           ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │                   ArbitrationEngine                        │
//! │  • Dispatches on input size (0 / 1 / many)                 │
//! │  • Picks the largest agreeing group or falls back          │
//! └─────────────────────────┬─────────────────────────────────┘
//!                           │
//!           ┌───────────────┼───────────────┐
//!           ▼               ▼               ▼
//!     ┌───────────┐   ┌───────────┐   ┌───────────┐
//!     │Similarity │   │ Consensus │   │Confidence │
//!     │  Scorer   │   │  Grouper  │   │Calculator │
//!     └───────────┘   └───────────┘   └───────────┘
//! ```
//!
//! # Components
//!
//! - **TextSimilarityScorer**: blended sequence/word/bigram similarity in [0, 1]
//! - **ConsensusGrouper**: greedy single-link grouping over a similarity matrix
//! - **ConfidenceCalculator**: self-confidence, agreement and bias into a tier
//! - **ArbitrationEngine**: the per-topic decision
//! - **RaceCoordinator**: per-race fan-out and collection
//!
//! # Usage
//!
//! ```ignore
//! use triangulation::config::ArbitrationConfig;
//! use triangulation::ensemble::ArbitrationEngine;
//!
//! let engine = ArbitrationEngine::new(ArbitrationConfig::default().shared());
//! let result = engine.arbitrate(&summaries);
//! println!("{} ({})", result.final_content, result.confidence);
//! ```

pub mod arbitration;
pub mod confidence;
pub mod coordinator;
pub mod grouping;
pub mod similarity;

// Re-export core types
pub use arbitration::{ArbitrationEngine, SharedArbitrationEngine};
pub use confidence::{bias_score, ConfidenceCalculator, ConfidenceScore, LOADED_TERMS};
pub use coordinator::{
    CoordinatorError, CoordinatorResult, RaceCoordinator, RaceTriangulation, TopicResult,
    TopicSummaries,
};
pub use grouping::{ConsensusGroup, ConsensusGrouper, SimilarityMatrix};
pub use similarity::{normalize, sequence_ratio, SimilarityBreakdown, TextSimilarityScorer};
