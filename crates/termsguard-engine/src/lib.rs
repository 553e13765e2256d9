//! The analysis pipeline: segment, tag and filter clauses, retrieve candidate
//! rules, adjudicate, and aggregate into a document verdict.

mod error;
pub use error::AnalysisError;

pub mod analyze;
pub mod context;
pub mod filter;
pub mod matcher;

pub use context::{AnalysisContext, ContextBuilder, build_memory_index};
pub use filter::{FilteredClause, NOISE_LABEL, relevance_filter};
pub use matcher::match_clauses;
