//! Confidence scoring for consensus groups
//!
//! Blends what the models claim about themselves with how much they
//! actually agree, then discounts for loaded political language:
//!
//! ```text
//! raw   = 0.5 * weighted_self_confidence + 0.5 * internal_agreement
//! score = max(0, raw * (1 - bias))
//! ```

use serde::{Deserialize, Serialize};

use super::similarity::TextSimilarityScorer;
use crate::config::SharedArbitrationConfig;
use crate::summary::{ConfidenceLevel, Summary};

/// Terms whose presence suggests a summary is editorializing
pub const LOADED_TERMS: &[&str] = &[
    "liberal",
    "conservative",
    "left-wing",
    "right-wing",
    "radical",
    "extremist",
    "biased",
];

/// Self-confidence used when every member has zero weight
const NEUTRAL_SELF_CONFIDENCE: f64 = 0.5;

/// Loaded-term occurrences per word, case-insensitive substring match.
///
/// Counts over the whole text, so one loaded word in a long document scores
/// lower than the same word in a one-liner.
pub fn bias_score(content: &str) -> f64 {
    let words = content.split_whitespace().count();
    if words == 0 {
        return 0.0;
    }

    let lower = content.to_lowercase();
    let occurrences: usize = LOADED_TERMS
        .iter()
        .map(|term| lower.matches(term).count())
        .sum();

    occurrences as f64 / words as f64
}

/// Scoring breakdown for one group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    /// Final continuous score
    pub score: f64,
    /// Tier derived from `score` and group size
    pub tier: ConfidenceLevel,
    pub weighted_self_confidence: f64,
    pub internal_agreement: f64,
    /// Highest member bias
    pub bias: f64,
}

/// Maps a consensus group to a confidence score and tier
#[derive(Debug, Clone)]
pub struct ConfidenceCalculator {
    config: SharedArbitrationConfig,
    scorer: TextSimilarityScorer,
}

impl ConfidenceCalculator {
    pub fn new(config: SharedArbitrationConfig) -> Self {
        Self {
            config,
            scorer: TextSimilarityScorer::new(),
        }
    }

    /// Score a group, computing its internal agreement from scratch
    pub fn score(&self, members: &[&Summary]) -> ConfidenceScore {
        let mut total = 0.0;
        let mut pairs = 0usize;
        for (pos, a) in members.iter().enumerate() {
            for b in &members[pos + 1..] {
                total += self.scorer.similarity(&a.content, &b.content);
                pairs += 1;
            }
        }
        let agreement = if pairs == 0 {
            1.0
        } else {
            total / pairs as f64
        };

        self.score_with_agreement(members, agreement)
    }

    /// Score a group whose mean pairwise similarity is already known
    pub fn score_with_agreement(
        &self,
        members: &[&Summary],
        internal_agreement: f64,
    ) -> ConfidenceScore {
        let weighted_self_confidence = self.weighted_self_confidence(members);
        let bias = members
            .iter()
            .map(|s| bias_score(&s.content))
            .fold(0.0, f64::max);

        let raw = 0.5 * weighted_self_confidence + 0.5 * internal_agreement;
        let score = (raw * (1.0 - bias)).max(0.0);

        ConfidenceScore {
            score,
            tier: self.tier_for(score, members.len()),
            weighted_self_confidence,
            internal_agreement,
            bias,
        }
    }

    /// Weighted mean of self-reported confidence
    pub fn weighted_self_confidence(&self, members: &[&Summary]) -> f64 {
        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for summary in members {
            let weight = self.config.model_weight(&summary.model);
            weighted += summary.confidence.as_score() * weight;
            total_weight += weight;
        }

        if total_weight > 0.0 {
            weighted / total_weight
        } else {
            NEUTRAL_SELF_CONFIDENCE
        }
    }

    /// Tier for a score; one source alone never earns MEDIUM
    pub fn tier_for(&self, score: f64, member_count: usize) -> ConfidenceLevel {
        let thresholds = &self.config.confidence;
        if score >= thresholds.high {
            ConfidenceLevel::High
        } else if score >= thresholds.medium && member_count >= 2 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}
