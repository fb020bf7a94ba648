//! Arbitration engine
//!
//! Turns the summaries collected for one topic into a single
//! [`TriangulatedResult`]. The input cardinality decides the path:
//!
//! ```text
//! N = 0  -> Empty      (LOW, no content)
//! N = 1  -> Single     (the summary's own confidence)
//! N >= 2 -> similarity matrix -> groups -> largest group
//!             size >= 2 -> Consensus  (scored, HIGH capped at MEDIUM on dissent)
//!             size == 1 -> Fallback   (highest-weight model, always LOW)
//! ```
//!
//! Arbitration never fails: degenerate inputs and disagreement are explicit
//! branches that produce a clearly labelled result.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::confidence::{bias_score, ConfidenceCalculator};
use super::grouping::{ConsensusGroup, ConsensusGrouper, SimilarityMatrix};
use super::similarity::TextSimilarityScorer;
use crate::config::{ArbitrationConfig, SharedArbitrationConfig};
use crate::summary::{
    ConfidenceLevel, ContributingResponse, Resolution, Summary, TriangulatedResult,
};

const DISSENT_CAP_NOTE: &str = "Confidence capped at medium because models disagreed.";

/// Shared reference to an ArbitrationEngine
pub type SharedArbitrationEngine = Arc<ArbitrationEngine>;

/// Multi-model consensus arbitration
#[derive(Debug, Clone)]
pub struct ArbitrationEngine {
    config: SharedArbitrationConfig,
    scorer: TextSimilarityScorer,
    grouper: ConsensusGrouper,
    confidence: ConfidenceCalculator,
}

impl ArbitrationEngine {
    /// Create an engine bound to a fixed configuration
    pub fn new(config: SharedArbitrationConfig) -> Self {
        Self {
            grouper: ConsensusGrouper::from_config(&config),
            confidence: ConfidenceCalculator::new(config.clone()),
            scorer: TextSimilarityScorer::new(),
            config,
        }
    }

    /// Create a shared reference to this engine
    pub fn shared(self) -> SharedArbitrationEngine {
        Arc::new(self)
    }

    pub fn config(&self) -> &ArbitrationConfig {
        &self.config
    }

    /// Arbitrate the summaries collected for one topic
    pub fn arbitrate(&self, summaries: &[Summary]) -> TriangulatedResult {
        let result = match summaries {
            [] => {
                warn!("No summaries available for arbitration");
                TriangulatedResult::error("No summaries were available for arbitration.")
            }
            [only] => self.single(only),
            _ => self.triangulate(summaries),
        };

        info!(
            summaries = summaries.len(),
            method = result.consensus_method(),
            confidence = %result.confidence,
            "Arbitration complete"
        );

        result
    }

    fn single(&self, summary: &Summary) -> TriangulatedResult {
        TriangulatedResult {
            final_content: summary.content.clone(),
            confidence: summary.confidence,
            contributing_responses: vec![summary.into()],
            resolution: Resolution::Single {
                model: summary.model.clone(),
            },
            arbitration_notes: format!(
                "Only one model response was available ({}); no triangulation possible.",
                summary.model
            ),
        }
    }

    fn triangulate(&self, summaries: &[Summary]) -> TriangulatedResult {
        let contents: Vec<&str> = summaries.iter().map(|s| s.content.as_str()).collect();
        let matrix = SimilarityMatrix::build(&self.scorer, &contents);
        let groups = self.grouper.group(&matrix);

        debug!(
            groups = ?groups.iter().map(|g| g.members()).collect::<Vec<_>>(),
            "Grouped summaries"
        );

        // First-formed group wins ties
        let mut winner: Option<&ConsensusGroup> = None;
        for group in &groups {
            if winner.map_or(true, |best| group.len() > best.len()) {
                winner = Some(group);
            }
        }

        match winner {
            Some(group) if group.len() >= 2 => {
                self.consensus(summaries, &matrix, group, groups.len() - 1)
            }
            _ => self.fallback(summaries),
        }
    }

    fn consensus(
        &self,
        summaries: &[Summary],
        matrix: &SimilarityMatrix,
        group: &ConsensusGroup,
        alternatives: usize,
    ) -> TriangulatedResult {
        let members: Vec<&Summary> = group.members().iter().map(|&i| &summaries[i]).collect();
        let agreement = matrix.mean_pairwise(group.members());
        let scored = self.confidence.score_with_agreement(&members, agreement);

        // Most detailed member wins; earliest on equal length
        let chosen = members
            .iter()
            .copied()
            .reduce(|best, s| {
                if s.content.chars().count() > best.content.chars().count() {
                    s
                } else {
                    best
                }
            })
            .map(|s| s.content.clone())
            .unwrap_or_default();

        let models: Vec<&str> = members.iter().map(|s| s.model.as_str()).collect();
        let mut notes = vec![format!(
            "Consensus reached by {} of {} models ({}); \
             mean agreement {:.2}, confidence score {:.2}.",
            members.len(),
            summaries.len(),
            models.join(", "),
            agreement,
            scored.score
        )];

        let mut confidence = scored.tier;
        if alternatives > 0 {
            let dissent = format!("{alternatives} alternative viewpoint(s) detected.");
            notes.push(dissent);
            if confidence == ConfidenceLevel::High {
                confidence = ConfidenceLevel::Medium;
                notes.push(DISSENT_CAP_NOTE.to_string());
            }
        }

        TriangulatedResult {
            final_content: chosen,
            confidence,
            contributing_responses: members
                .iter()
                .map(|s| ContributingResponse::from(*s))
                .collect(),
            resolution: Resolution::Consensus {
                agreeing: members.len(),
                total: summaries.len(),
                alternatives,
                score: scored.score,
            },
            arbitration_notes: notes.join(" "),
        }
    }

    /// Highest reliability weight; earliest on equal weight
    fn heaviest<'a>(&self, summaries: &'a [Summary]) -> Option<&'a Summary> {
        summaries.iter().reduce(|best, s| {
            if self.config.model_weight(&s.model) > self.config.model_weight(&best.model) {
                s
            } else {
                best
            }
        })
    }

    fn fallback(&self, summaries: &[Summary]) -> TriangulatedResult {
        let Some(best) = self.heaviest(summaries) else {
            return TriangulatedResult::error("No summaries were available for arbitration.");
        };

        warn!(
            summaries = summaries.len(),
            model = %best.model,
            "No consensus reached, falling back to most reliable model"
        );

        let mut notes = vec![format!(
            "No consensus reached among {} models; \
             using the response from {} (reliability weight {:.2}).",
            summaries.len(),
            best.model,
            self.config.model_weight(&best.model)
        )];

        let bias = bias_score(&best.content);
        if bias > 0.0 {
            notes.push(format!(
                "Potential bias detected in the selected response (score {bias:.3})."
            ));
        }

        TriangulatedResult {
            final_content: best.content.clone(),
            confidence: ConfidenceLevel::Low,
            contributing_responses: vec![best.into()],
            resolution: Resolution::Fallback {
                model: best.model.clone(),
                total: summaries.len(),
            },
            arbitration_notes: notes.join(" "),
        }
    }
}

impl Default for ArbitrationEngine {
    fn default() -> Self {
        Self::new(ArbitrationConfig::default().shared())
    }
}
