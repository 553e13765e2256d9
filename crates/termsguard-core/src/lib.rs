pub mod compliance;
pub mod config;
pub mod distill;
pub mod domain;
pub mod ontology;
pub mod pos;
pub mod risk;
pub mod scoring;
pub mod segment;
pub mod types;

pub use config::{ConfidenceLadder, ConfigError, FailurePolicy, PipelineConfig, SegmenterMode, SeverityPolicy};
pub use distill::distill;
pub use domain::{Domain, DomainSet, UnknownDomain};
pub use ontology::OntologyIndex;
pub use pos::{HeuristicTagger, Pos, PosTagger, TaggedToken};
pub use risk::predict_risks;
pub use scoring::match_confidence;
pub use segment::segment;
pub use types::{
    AnalysisResult, CandidateMatch, Clause, Evidence, Outcome, RiskPrediction, Rule, Severity,
    SeverityCounts, UnknownSeverity, Verdict, VerdictKind, Violation,
};
