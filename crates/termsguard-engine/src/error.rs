use termsguard_ai::AdjudicationError;
use termsguard_core::ConfigError;
use termsguard_store::StoreError;
use thiserror::Error;

/// Failures that abort one analysis. Empty results and degraded adjudication
/// are reported through [`termsguard_core::Outcome`] instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid analysis context: {0}")]
    Context(String),

    #[error("embedding failed: {0:#}")]
    Embedding(anyhow::Error),

    #[error("rule index: {0}")]
    Index(#[from] StoreError),

    #[error(transparent)]
    Adjudication(#[from] AdjudicationError),
}
