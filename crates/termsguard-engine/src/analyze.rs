//! Whole-document analysis.

use std::collections::HashMap;

use termsguard_core::risk::document_domains;
use termsguard_core::{
    AnalysisResult, CandidateMatch, Clause, FailurePolicy, Outcome, RiskPrediction, Severity,
    SeverityCounts, VerdictKind, Violation, match_confidence, predict_risks, segment,
};
use tracing::{info, warn};

use crate::{AnalysisContext, AnalysisError, match_clauses, relevance_filter};

const NO_CLAUSES_SUMMARY: &str = "No analyzable clauses found.";
const NO_MATCHES_SUMMARY: &str = "No clauses matched any rule.";

impl AnalysisContext {
    /// Run the full pipeline over one document.
    ///
    /// Empty documents and documents without candidate matches are reported
    /// through [`Outcome`], not as errors. An adjudication failure either
    /// degrades to unverified violations or aborts, per
    /// [`FailurePolicy`].
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        let segmented = segment(text, self.config.segmenter, self.config.min_clause_chars);
        info!(chars = text.len(), clauses = segmented.len(), "document segmented");

        let clauses: Vec<Clause> = relevance_filter(self, segmented)
            .into_iter()
            .map(|f| f.clause)
            .collect();
        if clauses.is_empty() {
            return Ok(empty_result(Vec::new(), NO_CLAUSES_SUMMARY, Outcome::NoClauses));
        }

        let future_risks = predict_risks(&document_domains(&clauses));
        let candidates = match_clauses(self, &clauses).await?;
        if candidates.is_empty() {
            return Ok(empty_result(future_risks, NO_MATCHES_SUMMARY, Outcome::NoMatches));
        }

        let by_id: HashMap<&str, &Clause> = clauses.iter().map(|c| (c.id.as_str(), c)).collect();
        let (violations, summary, outcome) = match self.adjudicator.adjudicate(&candidates).await {
            Ok(adjudication) => {
                let reasons: HashMap<usize, String> = adjudication
                    .verdicts
                    .into_iter()
                    .filter(|v| v.kind == VerdictKind::Violated)
                    .map(|v| (v.candidate_id, v.reason))
                    .collect();
                let violations = candidates
                    .iter()
                    .filter_map(|c| {
                        let reason = reasons.get(&c.id)?.clone();
                        self.violation(c, &by_id, Some(reason))
                    })
                    .collect();
                (violations, adjudication.summary, Outcome::Adjudicated)
            }
            Err(e) if self.config.on_adjudication_failure == FailurePolicy::Fail => {
                return Err(e.into());
            }
            Err(e) => {
                warn!(
                    error = %e,
                    candidates = candidates.len(),
                    "reporting candidate matches without adjudication"
                );
                let violations: Vec<Violation> = candidates
                    .iter()
                    .filter_map(|c| self.violation(c, &by_id, None))
                    .collect();
                let summary = format!(
                    "{} candidate match(es) could not be adjudicated and are unverified.",
                    violations.len()
                );
                (violations, summary, Outcome::Unadjudicated { error: e.to_string() })
            }
        };

        let severities: Vec<Severity> = violations.iter().map(|v| v.severity).collect();
        let overall_severity = self.config.severity_policy.overall(&severities);
        let counts = SeverityCounts::tally(&severities);
        info!(
            candidates = candidates.len(),
            violations = violations.len(),
            overall = %overall_severity,
            "analysis done"
        );
        Ok(AnalysisResult {
            overall_severity,
            violations,
            future_risks,
            counts,
            summary,
            outcome,
        })
    }

    fn violation(
        &self,
        candidate: &CandidateMatch,
        clauses: &HashMap<&str, &Clause>,
        reason: Option<String>,
    ) -> Option<Violation> {
        let rule = self.rules.get(&candidate.rule_id)?;
        let clause = clauses.get(candidate.clause_id.as_str())?;
        Some(Violation {
            rule_id: rule.rule_id.clone(),
            clause_id: candidate.clause_id.clone(),
            severity: rule.severity,
            confidence: match_confidence(&self.ontology, &self.config.confidence, clause, rule),
            evidence: candidate.evidence.clone(),
            rationale: rule.rationale.clone(),
            distance: candidate.distance,
            reason,
        })
    }
}

fn empty_result(future_risks: Vec<RiskPrediction>, summary: &str, outcome: Outcome) -> AnalysisResult {
    AnalysisResult {
        overall_severity: Severity::Low,
        violations: Vec::new(),
        future_risks,
        counts: SeverityCounts::default(),
        summary: summary.to_string(),
        outcome,
    }
}
