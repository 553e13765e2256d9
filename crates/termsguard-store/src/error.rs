use termsguard_core::{UnknownDomain, UnknownSeverity};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rule file not found: {0}")]
    NotFound(std::path::PathBuf),

    #[error("read rule file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse rule file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rule {rule_id}: {source}")]
    UnknownDomain {
        rule_id: String,
        #[source]
        source: UnknownDomain,
    },

    #[error("rule {rule_id}: {source}")]
    UnknownSeverity {
        rule_id: String,
        #[source]
        source: UnknownSeverity,
    },

    #[error("rule at position {0} has no rule_id")]
    MissingId(usize),

    #[error("duplicate rule id: {0}")]
    DuplicateRule(String),

    #[error("rule set is empty")]
    Empty,

    #[error("index rejected filter: {0}")]
    FilterRejected(String),

    #[error("vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[cfg(feature = "lancedb")]
    #[error("lancedb error: {0}")]
    Lance(#[from] lancedb::Error),

    #[cfg(feature = "lancedb")]
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("{0}")]
    Other(String),
}
