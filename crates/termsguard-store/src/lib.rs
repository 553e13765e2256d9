//! Rule corpus and vector index: JSON rule loading, in-memory exact search,
//! LanceDB (vector) search.

mod error;
pub use error::StoreError;

pub mod index;
pub mod rules;

pub use index::{MemoryIndex, Neighbor, NeighborIndex, Query};
pub use rules::{RuleSet, clean_rationale};

#[cfg(feature = "lancedb")]
mod lance;
#[cfg(feature = "lancedb")]
pub use lance::LanceRuleIndex;
