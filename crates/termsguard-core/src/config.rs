//! Pipeline tuning knobs.
//!
//! Every threshold in the pipeline is empirically chosen, so all of them live
//! here rather than as constants. A JSON file may override any subset; absent
//! fields take the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(std::path::PathBuf),
    #[error("read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How sentences are found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmenterMode {
    /// Unicode sentence boundaries (UAX #29).
    #[default]
    Sentences,
    /// Split on ". " only.
    Periods,
}

/// Per-document severity aggregation. Exactly one is in force per run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityPolicy {
    /// Highest severity present wins.
    #[default]
    Dominance,
    /// Weighted sum bucketed against fixed thresholds.
    WeightedSum,
}

/// What to report when candidates exist but adjudication failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Report unverified candidate matches and mark the outcome.
    #[default]
    Degrade,
    /// Fail the whole analysis.
    Fail,
}

/// Confidence assigned to a match, highest applicable rung wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceLadder {
    /// A keyword of one of the rule's domains appears in the clause.
    pub keyword: f32,
    /// The clause carries at least one domain.
    pub tagged: f32,
    /// Domain-less structural match.
    pub structural: f32,
}

impl Default for ConfidenceLadder {
    fn default() -> Self {
        Self {
            keyword: 0.9,
            tagged: 0.6,
            structural: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fragments shorter than this (in chars, after trimming) are dropped.
    pub min_clause_chars: usize,
    pub segmenter: SegmenterMode,
    /// "irrelevant noise" must score above this to drop a clause.
    pub noise_threshold: f32,
    /// Clause text is truncated to this many chars before classification.
    pub noise_max_chars: usize,
    /// Nearest rules requested per clause.
    pub top_k: usize,
    /// Neighbors farther than this are discarded.
    pub distance_threshold: f32,
    pub confidence: ConfidenceLadder,
    pub severity_policy: SeverityPolicy,
    /// Skip clauses already phrased in a known-compliant way.
    pub compliance_guard: bool,
    pub on_adjudication_failure: FailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_clause_chars: 15,
            segmenter: SegmenterMode::default(),
            noise_threshold: 0.7,
            noise_max_chars: 512,
            top_k: 2,
            distance_threshold: 0.40,
            confidence: ConfidenceLadder::default(),
            severity_policy: SeverityPolicy::default(),
            compliance_guard: true,
            on_adjudication_failure: FailurePolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be at least 1".into()));
        }
        if !(0.0..=2.0).contains(&self.distance_threshold) {
            return Err(ConfigError::Invalid(format!(
                "distance_threshold {} outside [0, 2]",
                self.distance_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.noise_threshold) {
            return Err(ConfigError::Invalid(format!(
                "noise_threshold {} outside [0, 1]",
                self.noise_threshold
            )));
        }
        let c = &self.confidence;
        if !(c.keyword >= c.tagged && c.tagged >= c.structural) {
            return Err(ConfigError::Invalid(
                "confidence ladder must be non-increasing".into(),
            ));
        }
        Ok(())
    }
}
