//! Core types for arbitration input and output
//!
//! A [`Summary`] is one model's opinion about a single topic. A
//! [`TriangulatedResult`] is the arbitrated answer for that topic, carrying
//! the chosen content, a confidence tier and an audit trail of the inputs
//! that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Model identifier (e.g. `gpt-4o`, `claude-3.5`, `grok-4`)
pub type ModelId = String;

/// Confidence tier attached to any produced content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl ConfidenceLevel {
    /// Numeric value used when blending self-reported confidence
    pub fn as_score(&self) -> f64 {
        match self {
            ConfidenceLevel::High => 0.9,
            ConfidenceLevel::Medium => 0.7,
            ConfidenceLevel::Low => 0.3,
            ConfidenceLevel::Unknown => 0.1,
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "high"),
            ConfidenceLevel::Medium => write!(f, "medium"),
            ConfidenceLevel::Low => write!(f, "low"),
            ConfidenceLevel::Unknown => write!(f, "unknown"),
        }
    }
}

/// One model's summary of a topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Free-text content. Null or non-string values become `""`.
    #[serde(default, deserialize_with = "lenient_content")]
    pub content: String,

    /// Model that produced this summary
    pub model: ModelId,

    /// Confidence self-reported by the model/provider
    #[serde(default)]
    pub confidence: ConfidenceLevel,

    /// When the summary was produced
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Token count reported by the provider
    #[serde(default)]
    pub tokens_used: u32,

    /// Provider-specific extras
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Summary {
    /// Create a new summary stamped with the current time
    pub fn new(
        model: impl Into<ModelId>,
        content: impl Into<String>,
        confidence: ConfidenceLevel,
    ) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            confidence,
            created_at: Utc::now(),
            tokens_used: 0,
            metadata: HashMap::new(),
        }
    }

    /// Set token usage
    pub fn with_tokens(mut self, tokens_used: u32) -> Self {
        self.tokens_used = tokens_used;
        self
    }

    /// Set creation timestamp
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

fn lenient_content<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        _ => String::new(),
    })
}

/// Audit-trail entry for a summary that fed a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributingResponse {
    pub model: ModelId,
    pub content: String,
    pub tokens_used: u32,
    pub created_at: DateTime<Utc>,
}

impl From<&Summary> for ContributingResponse {
    fn from(summary: &Summary) -> Self {
        Self {
            model: summary.model.clone(),
            content: summary.content.clone(),
            tokens_used: summary.tokens_used,
            created_at: summary.created_at,
        }
    }
}

/// How a result was derived
///
/// Serialized with its label under `consensus_method`, next to the
/// variant's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "consensus_method")]
pub enum Resolution {
    /// No usable input, or arbitration failed
    #[serde(rename = "error")]
    Empty,

    /// Exactly one summary was available
    #[serde(rename = "single")]
    Single { model: ModelId },

    /// Two or more summaries agreed
    #[serde(rename = "2-of-3")]
    Consensus {
        /// Members of the winning group
        agreeing: usize,
        /// Summaries considered
        total: usize,
        /// Groups other than the winner
        alternatives: usize,
        /// Continuous confidence score of the winning group
        score: f64,
    },

    /// Nothing agreed; the most reliable model was used
    #[serde(rename = "fallback_best_model")]
    Fallback { model: ModelId, total: usize },
}

impl Resolution {
    /// Stable label for downstream records
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::Empty => "error",
            Resolution::Single { .. } => "single",
            Resolution::Consensus { .. } => "2-of-3",
            Resolution::Fallback { .. } => "fallback_best_model",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Arbitrated answer for one topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangulatedResult {
    /// Content chosen to represent the topic
    pub final_content: String,

    /// Final confidence tier
    pub confidence: ConfidenceLevel,

    /// Inputs that built this result
    pub contributing_responses: Vec<ContributingResponse>,

    /// How the result was derived
    #[serde(flatten)]
    pub resolution: Resolution,

    /// Human-readable explanation, including dissent notices
    pub arbitration_notes: String,
}

impl TriangulatedResult {
    /// A LOW-confidence empty result explaining why nothing was produced
    pub fn error(note: impl Into<String>) -> Self {
        Self {
            final_content: String::new(),
            confidence: ConfidenceLevel::Low,
            contributing_responses: Vec::new(),
            resolution: Resolution::Empty,
            arbitration_notes: note.into(),
        }
    }

    /// Label of the consensus method (`2-of-3`, `single`, ...)
    pub fn consensus_method(&self) -> &'static str {
        self.resolution.label()
    }

    /// Whether two or more models agreed on this result
    pub fn is_consensus(&self) -> bool {
        matches!(self.resolution, Resolution::Consensus { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_scores_are_ordered() {
        assert!(ConfidenceLevel::High.as_score() > ConfidenceLevel::Medium.as_score());
        assert!(ConfidenceLevel::Medium.as_score() > ConfidenceLevel::Low.as_score());
        assert!(ConfidenceLevel::Low.as_score() > ConfidenceLevel::Unknown.as_score());
    }

    #[test]
    fn test_null_content_becomes_empty() {
        let json = r#"{"content": null, "model": "gpt-4o", "confidence": "high"}"#;
        let summary: Summary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.content, "");
        assert_eq!(summary.confidence, ConfidenceLevel::High);
    }

    #[test]
    fn test_non_string_content_becomes_empty() {
        let json = r#"{"content": {"text": "nested"}, "model": "grok-4"}"#;
        let summary: Summary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.content, "");
        assert_eq!(summary.confidence, ConfidenceLevel::Unknown);
    }

    #[test]
    fn test_missing_content_becomes_empty() {
        let summary: Summary = serde_json::from_str(r#"{"model": "claude-3.5"}"#).unwrap();
        assert_eq!(summary.content, "");
        assert_eq!(summary.tokens_used, 0);
    }

    #[test]
    fn test_resolution_labels() {
        assert_eq!(Resolution::Empty.label(), "error");
        assert_eq!(
            Resolution::Single {
                model: "gpt-4o".into()
            }
            .label(),
            "single"
        );
        let consensus = Resolution::Consensus {
            agreeing: 2,
            total: 3,
            alternatives: 1,
            score: 0.75,
        };
        assert_eq!(consensus.to_string(), "2-of-3");

        let json = serde_json::to_string(&consensus).unwrap();
        assert!(json.contains(r#""consensus_method":"2-of-3""#));
    }

    #[test]
    fn test_result_json_has_top_level_consensus_method() {
        let result = TriangulatedResult {
            final_content: "Supports transit".to_string(),
            confidence: ConfidenceLevel::Medium,
            contributing_responses: Vec::new(),
            resolution: Resolution::Consensus {
                agreeing: 2,
                total: 3,
                alternatives: 1,
                score: 0.75,
            },
            arbitration_notes: String::new(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["consensus_method"], "2-of-3");
        assert_eq!(json["agreeing"], 2);
        assert_eq!(json["confidence"], "medium");
        assert!(json.get("resolution").is_none());

        let back: TriangulatedResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_error_result_json() {
        let result = TriangulatedResult::error("no input");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["consensus_method"], "error");

        let back: TriangulatedResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.resolution, Resolution::Empty);
        assert_eq!(back.arbitration_notes, "no input");
    }

    #[test]
    fn test_error_result() {
        let result = TriangulatedResult::error("nothing to do");
        assert_eq!(result.consensus_method(), "error");
        assert_eq!(result.confidence, ConfidenceLevel::Low);
        assert!(result.final_content.is_empty());
        assert!(!result.is_consensus());
    }

    #[test]
    fn test_contributing_response_from_summary() {
        let created_at = "2026-03-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let summary = Summary::new("gpt-4o", "Supports transit", ConfidenceLevel::Medium)
            .with_tokens(42)
            .with_created_at(created_at)
            .with_metadata("provider", serde_json::json!("openai"));
        let contrib = ContributingResponse::from(&summary);
        assert_eq!(contrib.model, "gpt-4o");
        assert_eq!(contrib.tokens_used, 42);
        assert_eq!(contrib.created_at, created_at);
    }
}
