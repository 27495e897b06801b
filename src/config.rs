//! Configuration for quality routing and feedback validation
//!
//! Bounds, scoring strategy and routing policy are supplied by the surrounding
//! system at construction time. Every section is optional in the TOML file and
//! falls back to the documented defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Top-level configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct QualityConfig {
    #[serde(default)]
    pub feedback: FeedbackSection,
    #[serde(default)]
    pub scoring: ScoringSection,
    #[serde(default)]
    pub routing: RoutingSection,
}

/// Valid ranges for feedback scores and anonymized ratings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackSection {
    /// Lowest accepted feedback score (default: 0.0)
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    /// Highest accepted feedback score (default: 1.0)
    #[serde(default = "default_max_score")]
    pub max_score: f64,
    /// Lowest accepted anonymized rating (default: 1.0)
    #[serde(default = "default_min_rating")]
    pub min_rating: f64,
    /// Highest accepted anonymized rating (default: 5.0)
    #[serde(default = "default_max_rating")]
    pub max_rating: f64,
}

impl Default for FeedbackSection {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            max_score: default_max_score(),
            min_rating: default_min_rating(),
            max_rating: default_max_rating(),
        }
    }
}

fn default_min_score() -> f64 {
    0.0
}

fn default_max_score() -> f64 {
    1.0
}

fn default_min_rating() -> f64 {
    1.0
}

fn default_max_rating() -> f64 {
    5.0
}

/// Scoring strategy selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategyKind {
    #[default]
    Mean,
    RecencyWeighted,
}

/// Scoring section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScoringSection {
    /// Reduction applied to an agent's history (default: mean)
    #[serde(default)]
    pub strategy: ScoringStrategyKind,
    /// Half-life for recency weighting, required when strategy = "recency_weighted"
    pub half_life_secs: Option<u64>,
}

/// Routing policy section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingSection {
    /// Pick the first candidate when no candidate has any evidence (default: true)
    #[serde(default = "default_fallback_to_first")]
    pub fallback_to_first_candidate: bool,
    /// System-wide acceptance threshold used when a client has none
    pub default_threshold: Option<f64>,
    /// Bound on each storage call in milliseconds (default: 5000)
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

impl Default for RoutingSection {
    fn default() -> Self {
        Self {
            fallback_to_first_candidate: default_fallback_to_first(),
            default_threshold: None,
            store_timeout_ms: default_store_timeout_ms(),
        }
    }
}

fn default_fallback_to_first() -> bool {
    true
}

fn default_store_timeout_ms() -> u64 {
    5000
}

impl RoutingSection {
    /// Store timeout as a `Duration`
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl QualityConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: QualityConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate bounds and policy consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fb = &self.feedback;
        validate_range("score", fb.min_score, fb.max_score)?;
        validate_range("rating", fb.min_rating, fb.max_rating)?;

        if self.scoring.strategy == ScoringStrategyKind::RecencyWeighted {
            match self.scoring.half_life_secs {
                Some(secs) if secs > 0 => {}
                _ => {
                    return Err(ConfigError::InvalidConfig(
                        "recency_weighted scoring requires half_life_secs > 0".to_string(),
                    ))
                }
            }
        }

        if self.routing.store_timeout_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "store_timeout_ms must be greater than zero".to_string(),
            ));
        }

        if let Some(threshold) = self.routing.default_threshold {
            if !threshold.is_finite() {
                return Err(ConfigError::InvalidConfig(
                    "default_threshold must be a finite number".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn validate_range(name: &str, min: f64, max: f64) -> Result<(), ConfigError> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(ConfigError::InvalidConfig(format!(
            "{name} range [{min}, {max}] is not a valid finite interval"
        )));
    }
    Ok(())
}
