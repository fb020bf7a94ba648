//! Arbitration configuration
//!
//! Static, process-wide settings: model reliability weights, agreement and
//! confidence thresholds, and the council's gather limits. Loaded once at
//! startup (TOML file and/or `TRIANGULATION_*` environment variables) and
//! shared read-only behind an `Arc` for the rest of the run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Weight used for models missing from the reliability table
pub const DEFAULT_MODEL_WEIGHT: f64 = 1.0;

/// Built-in reliability weights for the default council
const DEFAULT_MODEL_WEIGHTS: [(&str, f64); 3] = [
    ("gpt-4o", 1.0),
    ("claude-3.5", 1.0),
    ("grok-4", 0.8),
];

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv { var: String, value: String },

    #[error("Threshold {name} must be within [0, 1], got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    #[error("Medium confidence threshold {medium} exceeds high threshold {high}")]
    ThresholdOrder { medium: f64, high: f64 },

    #[error("Weight for model {model} must be finite and non-negative, got {weight}")]
    InvalidWeight { model: String, weight: f64 },

    #[error("Gather timeout must be greater than zero")]
    ZeroTimeout,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Shared reference to an immutable configuration
pub type SharedArbitrationConfig = Arc<ArbitrationConfig>;

/// Similarity cut-offs used by the grouper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityThresholds {
    /// Minimum similarity for a summary to join a group
    pub moderate_agreement: f64,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self {
            moderate_agreement: 0.6,
        }
    }
}

/// Score boundaries for confidence tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 0.8,
            medium: 0.6,
        }
    }
}

/// Limits for gathering summaries from providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatherConfig {
    /// Per-attempt timeout for a single provider call
    pub timeout_secs: u64,
    /// Extra attempts after the first failure
    pub max_retries: u32,
}

impl GatherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Top-level arbitration configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbitrationConfig {
    /// Model id -> reliability weight
    pub model_weights: HashMap<String, f64>,
    pub similarity: SimilarityThresholds,
    pub confidence: ConfidenceThresholds,
    pub gather: GatherConfig,
}

impl Default for ArbitrationConfig {
    fn default() -> Self {
        let model_weights = DEFAULT_MODEL_WEIGHTS
            .into_iter()
            .map(|(model, weight)| (model.to_string(), weight))
            .collect();

        Self {
            model_weights,
            similarity: SimilarityThresholds::default(),
            confidence: ConfidenceThresholds::default(),
            gather: GatherConfig::default(),
        }
    }
}

impl ArbitrationConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `TRIANGULATION_*` environment overrides, then validate
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.with_overrides_from(|var| std::env::var(var).ok())
    }

    fn with_overrides_from<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "TRIANGULATION_MODERATE_AGREEMENT")? {
            self.similarity.moderate_agreement = v;
        }
        if let Some(v) = parse_var(&lookup, "TRIANGULATION_HIGH_CONFIDENCE")? {
            self.confidence.high = v;
        }
        if let Some(v) = parse_var(&lookup, "TRIANGULATION_MEDIUM_CONFIDENCE")? {
            self.confidence.medium = v;
        }
        if let Some(v) = parse_var(&lookup, "TRIANGULATION_TIMEOUT_SECS")? {
            self.gather.timeout_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "TRIANGULATION_MAX_RETRIES")? {
            self.gather.max_retries = v;
        }
        if let Some(raw) = lookup("TRIANGULATION_MODEL_WEIGHTS") {
            for (model, weight) in parse_weights(&raw)? {
                self.model_weights.insert(model, weight);
            }
        }

        self.validate()?;
        Ok(self)
    }

    /// Check thresholds and weights are usable
    pub fn validate(&self) -> ConfigResult<()> {
        check_unit("moderate_agreement", self.similarity.moderate_agreement)?;
        check_unit("high", self.confidence.high)?;
        check_unit("medium", self.confidence.medium)?;

        if self.confidence.medium > self.confidence.high {
            return Err(ConfigError::ThresholdOrder {
                medium: self.confidence.medium,
                high: self.confidence.high,
            });
        }

        for (model, &weight) in &self.model_weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    model: model.clone(),
                    weight,
                });
            }
        }

        if self.gather.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }

    /// Reliability weight for a model, defaulting to 1.0
    pub fn model_weight(&self, model: &str) -> f64 {
        self.model_weights
            .get(model)
            .copied()
            .unwrap_or(DEFAULT_MODEL_WEIGHT)
    }

    /// Builder-style weight override, mainly for tests and embedding callers
    pub fn with_model_weight(mut self, model: impl Into<String>, weight: f64) -> Self {
        self.model_weights.insert(model.into(), weight);
        self
    }

    /// Wrap in an `Arc` for sharing across tasks
    pub fn shared(self) -> SharedArbitrationConfig {
        Arc::new(self)
    }
}

fn check_unit(name: &'static str, value: f64) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ThresholdOutOfRange { name, value })
    }
}

fn parse_var<F, T>(lookup: &F, var: &str) -> ConfigResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    let parsed = value.trim().parse();
    match parsed {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(ConfigError::InvalidEnv {
            var: var.to_string(),
            value,
        }),
    }
}

/// Parse `model=weight,model=weight`
fn parse_weights(raw: &str) -> ConfigResult<Vec<(String, f64)>> {
    let invalid = || ConfigError::InvalidEnv {
        var: "TRIANGULATION_MODEL_WEIGHTS".to_string(),
        value: raw.to_string(),
    };

    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (model, weight) = pair.split_once('=').ok_or_else(invalid)?;
            let model = model.trim();
            if model.is_empty() {
                return Err(invalid());
            }
            let weight: f64 = weight.trim().parse().map_err(|_| invalid())?;
            Ok((model.to_string(), weight))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ArbitrationConfig::default();
        assert_eq!(config.similarity.moderate_agreement, 0.6);
        assert_eq!(config.confidence.high, 0.8);
        assert_eq!(config.confidence.medium, 0.6);
        assert_eq!(config.gather.timeout(), Duration::from_secs(120));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_model_weight_defaults_to_one() {
        let config = ArbitrationConfig::default();
        assert_eq!(config.model_weight("some-new-model"), 1.0);
        assert_eq!(config.model_weight("grok-4"), 0.8);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ArbitrationConfig::from_toml_str(
            r#"
[model_weights]
"gpt-4o" = 0.95

[confidence]
high = 0.85
"#,
        )
        .unwrap();

        assert_eq!(config.model_weight("gpt-4o"), 0.95);
        assert_eq!(config.confidence.high, 0.85);
        assert_eq!(config.confidence.medium, 0.6);
        assert_eq!(config.similarity.moderate_agreement, 0.6);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[similarity]\nmoderate_agreement = 0.7").unwrap();

        let config = ArbitrationConfig::load(file.path()).unwrap();
        assert_eq!(config.similarity.moderate_agreement, 0.7);
    }

    #[test]
    fn test_load_missing_file() {
        let result = ArbitrationConfig::load("/nonexistent/triangulation.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let result = ArbitrationConfig::from_toml_str("[confidence]\nhigh = 0.5\nmedium = 0.7");
        assert!(matches!(result, Err(ConfigError::ThresholdOrder { .. })));
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let result = ArbitrationConfig::from_toml_str("[similarity]\nmoderate_agreement = 1.5");
        assert!(matches!(
            result,
            Err(ConfigError::ThresholdOutOfRange {
                name: "moderate_agreement",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_negative_weight() {
        let config = ArbitrationConfig::default().with_model_weight("gpt-4o", -1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let config = ArbitrationConfig::default()
            .with_overrides_from(env(&[
                ("TRIANGULATION_MODERATE_AGREEMENT", "0.55"),
                ("TRIANGULATION_MAX_RETRIES", "0"),
                ("TRIANGULATION_MODEL_WEIGHTS", "grok-4=1.2, llama = 0.4"),
            ]))
            .unwrap();

        assert_eq!(config.similarity.moderate_agreement, 0.55);
        assert_eq!(config.gather.max_retries, 0);
        assert_eq!(config.model_weight("grok-4"), 1.2);
        assert_eq!(config.model_weight("llama"), 0.4);
        assert_eq!(config.model_weight("gpt-4o"), 1.0);
    }

    #[test]
    fn test_env_override_invalid_number() {
        let result = ArbitrationConfig::default()
            .with_overrides_from(env(&[("TRIANGULATION_HIGH_CONFIDENCE", "very")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));
    }

    #[test]
    fn test_env_override_malformed_weights() {
        let result = ArbitrationConfig::default()
            .with_overrides_from(env(&[("TRIANGULATION_MODEL_WEIGHTS", "gpt-4o:1.0")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = ArbitrationConfig::from_toml_str("[gather]\ntimeout_secs = 0");
        assert!(matches!(result, Err(ConfigError::ZeroTimeout)));
    }
}
