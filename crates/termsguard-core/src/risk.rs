//! Compound-risk forecasting from domain co-occurrence.
//!
//! A coarse lookup table, not a classifier: each pattern fires when all of its
//! domains appear somewhere in the document, regardless of which clause.

use crate::domain::{Domain, DomainSet};
use crate::types::{Clause, RiskPrediction};

pub struct RiskPattern {
    pub requires: &'static [Domain],
    pub risk: &'static str,
    pub confidence: f32,
}

/// Patterns in evaluation order. Output order follows this table.
pub const RISK_PATTERNS: &[RiskPattern] = &[
    RiskPattern {
        requires: &[Domain::DataRetention, Domain::Consent],
        risk: "Indefinite data retention after consent withdrawal",
        confidence: 0.82,
    },
    RiskPattern {
        requires: &[Domain::ChildrenData, Domain::DataCollection],
        risk: "Regulatory action for unlawful child data processing",
        confidence: 0.90,
    },
    RiskPattern {
        requires: &[Domain::SecurityPractices, Domain::SensitiveData],
        risk: "High breach impact due to sensitive data exposure",
        confidence: 0.85,
    },
];

/// Union of domains across every clause.
pub fn document_domains<'a>(clauses: impl IntoIterator<Item = &'a Clause>) -> DomainSet {
    clauses
        .into_iter()
        .flat_map(|c| c.domains.iter().copied())
        .collect()
}

pub fn predict_risks(domains: &DomainSet) -> Vec<RiskPrediction> {
    RISK_PATTERNS
        .iter()
        .filter(|p| p.requires.iter().all(|d| domains.contains(d)))
        .map(|p| RiskPrediction {
            risk: p.risk.to_string(),
            confidence: p.confidence,
        })
        .collect()
}
