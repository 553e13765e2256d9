//! Typed records flowing through one analysis run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainSet;

/// Section label given to clauses when the source carries no structure.
pub const DEFAULT_SECTION: &str = "GENERAL";

/// Ordinal rule severity: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity: {0:?}")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

/// One segmented unit of document text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// Unique within one analysis run; not stable across runs.
    pub id: String,
    pub text: String,
    pub domains: DomainSet,
    pub section: String,
}

impl Clause {
    /// A fresh, untagged clause in the default section.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            domains: DomainSet::new(),
            section: DEFAULT_SECTION.to_string(),
        }
    }

    /// The same clause carrying its ontology tags.
    pub fn with_domains(self, domains: DomainSet) -> Self {
        Self { domains, ..self }
    }
}

/// One law/requirement entry in the reference corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub rule_id: String,
    pub domains: DomainSet,
    pub severity: Severity,
    /// Citation text of the law itself.
    pub raw_law: String,
    /// Normalized description; this is what gets embedded.
    pub rationale: String,
}

/// What a candidate match rests on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Original (non-distilled) clause text.
    pub clause_text: String,
    pub law_excerpt: String,
    pub matched_domains: DomainSet,
}

/// A retrieved (clause, rule) pairing awaiting adjudication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMatch {
    /// Position in the run's candidate list; the adjudicator keys on it.
    pub id: usize,
    pub clause_id: String,
    pub rule_id: String,
    /// Cosine distance over normalized embeddings, in `[0, 2]`.
    pub distance: f32,
    pub matched_domains: DomainSet,
    pub evidence: Evidence,
}

/// Adjudicated classification of one candidate match.
///
/// A three-way enum, so "violated and irrelevant" cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    Violated,
    Compliant,
    Irrelevant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub candidate_id: usize,
    pub kind: VerdictKind,
    pub reason: String,
}

impl Verdict {
    pub fn violated(&self) -> bool {
        self.kind == VerdictKind::Violated
    }

    pub fn irrelevant(&self) -> bool {
        self.kind == VerdictKind::Irrelevant
    }
}

/// A flagged clause as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub clause_id: String,
    pub severity: Severity,
    pub confidence: f32,
    pub evidence: Evidence,
    pub rationale: String,
    pub distance: f32,
    /// Adjudicator's one-line reason; `None` when the match was not adjudicated.
    pub reason: Option<String>,
}

/// A compound risk forecast from domain co-occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPrediction {
    pub risk: String,
    pub confidence: f32,
}

/// Violation counts per severity level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn tally<'a>(severities: impl IntoIterator<Item = &'a Severity>) -> Self {
        let mut counts = Self::default();
        for severity in severities {
            counts.total += 1;
            match severity {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }
}

/// How an analysis run ended. Distinguishes "nothing found" from "could not ask".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// No clause survived segmentation and filtering.
    NoClauses,
    /// Clauses survived but none matched a rule within the distance threshold.
    NoMatches,
    /// Every candidate received a verdict.
    Adjudicated,
    /// Candidates were found but the adjudicator failed; violations are unverified.
    Unadjudicated { error: String },
}

/// The document-level response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub overall_severity: Severity,
    pub violations: Vec<Violation>,
    pub future_risks: Vec<RiskPrediction>,
    pub counts: SeverityCounts,
    pub summary: String,
    pub outcome: Outcome,
}
