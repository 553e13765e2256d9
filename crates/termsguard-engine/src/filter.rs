//! Two-gate relevance filter.
//!
//! Gate 1 is lexical and always runs: a clause with no ontology keyword is
//! dropped. Gate 2 is the optional zero-shot noise classifier; it drops a
//! clause only on a confident "irrelevant noise" verdict and keeps the clause
//! whenever the classifier errors.

use termsguard_ai::NOISE_LABELS;
use termsguard_core::Clause;
use tracing::{debug, info, warn};

use crate::AnalysisContext;

pub const NOISE_LABEL: &str = NOISE_LABELS[1];

/// A clause that passed both gates, tagged with its domains.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredClause {
    pub clause: Clause,
    /// Audit string such as `"Valid (Matched: 3 terms)"`.
    pub reason: String,
}

/// Tag every clause and keep the relevant ones, in input order.
pub fn relevance_filter(ctx: &AnalysisContext, clauses: Vec<Clause>) -> Vec<FilteredClause> {
    let total = clauses.len();
    let mut kept = Vec::with_capacity(total);

    for clause in clauses {
        let hits = ctx.ontology.matches(&clause.text);
        if hits.is_empty() {
            debug!(clause_id = %clause.id, reason = "no ontology terms", "clause dropped");
            continue;
        }
        let domains = hits
            .iter()
            .filter_map(|kw| ctx.ontology.lookup(kw))
            .collect();
        let clause = clause.with_domains(domains);

        if is_noise(ctx, &clause) {
            continue;
        }
        kept.push(FilteredClause {
            reason: format!("Valid (Matched: {} terms)", hits.len()),
            clause,
        });
    }

    info!(clauses = total, kept = kept.len(), "relevance filter done");
    kept
}

fn is_noise(ctx: &AnalysisContext, clause: &Clause) -> bool {
    let Some(classifier) = &ctx.noise else {
        return false;
    };
    let text: String = clause
        .text
        .chars()
        .take(ctx.config.noise_max_chars)
        .collect();

    match classifier.classify(&text, &NOISE_LABELS) {
        Ok(ranked) => match ranked.first() {
            Some((label, score)) if label == NOISE_LABEL && *score > ctx.config.noise_threshold => {
                debug!(clause_id = %clause.id, score, reason = "irrelevant noise", "clause dropped");
                true
            }
            _ => false,
        },
        Err(e) => {
            warn!(clause_id = %clause.id, error = %e, "noise classifier failed, keeping clause");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use termsguard_ai::NoiseClassifier;
    use termsguard_core::{Domain, PipelineConfig, Rule, Severity};
    use termsguard_store::RuleSet;

    /// Returns a fixed noise score and counts calls.
    struct FixedClassifier {
        noise_score: f32,
        calls: AtomicUsize,
    }

    impl NoiseClassifier for FixedClassifier {
        fn classify(&self, _text: &str, _labels: &[&str]) -> anyhow::Result<Vec<(String, f32)>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut ranked = vec![
                (NOISE_LABELS[0].to_string(), 1.0 - self.noise_score),
                (NOISE_LABEL.to_string(), self.noise_score),
            ];
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
            Ok(ranked)
        }
    }

    struct BrokenClassifier;

    impl NoiseClassifier for BrokenClassifier {
        fn classify(&self, _text: &str, _labels: &[&str]) -> anyhow::Result<Vec<(String, f32)>> {
            anyhow::bail!("model not loaded")
        }
    }

    fn rules() -> Arc<RuleSet> {
        Arc::new(
            RuleSet::from_rules(vec![Rule {
                rule_id: "R1".into(),
                domains: [Domain::Consent].into(),
                severity: Severity::Low,
                raw_law: "law".into(),
                rationale: "obtain consent".into(),
            }])
            .unwrap(),
        )
    }

    fn ctx(noise: Option<Arc<dyn NoiseClassifier>>) -> AnalysisContext {
        let mut builder = AnalysisContext::builder(PipelineConfig::default(), rules());
        if let Some(noise) = noise {
            builder = builder.noise_classifier(noise);
        }
        builder.build().unwrap()
    }

    fn clauses(texts: &[&str]) -> Vec<Clause> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Clause::new(format!("c{i}"), *t))
            .collect()
    }

    #[test]
    fn lexical_gate() {
        let kept = relevance_filter(
            &ctx(None),
            clauses(&[
                "We retain user data and share it with third parties.",
                "Click the button at the top of the page to continue.",
            ]),
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].clause.id, "c0");
        assert!(kept[0].clause.domains.contains(&Domain::DataRetention));
        assert!(kept[0].clause.domains.contains(&Domain::DataSharing));
        assert!(kept[0].reason.starts_with("Valid (Matched: "));
    }

    #[test]
    fn confident_noise_is_dropped() {
        let classifier = Arc::new(FixedClassifier {
            noise_score: 0.9,
            calls: AtomicUsize::new(0),
        });
        let kept = relevance_filter(
            &ctx(Some(classifier.clone())),
            clauses(&["We collect cookies.", "Subscribe to our newsletter for third party deals."]),
        );
        assert!(kept.is_empty());
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn weak_noise_is_kept() {
        let classifier = Arc::new(FixedClassifier {
            noise_score: 0.7,
            calls: AtomicUsize::new(0),
        });
        let kept = relevance_filter(&ctx(Some(classifier)), clauses(&["We collect cookies."]));
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn classifier_failure_fails_open() {
        let kept = relevance_filter(
            &ctx(Some(Arc::new(BrokenClassifier))),
            clauses(&["We collect cookies."]),
        );
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn untagged_clauses_never_reach_the_classifier() {
        let classifier = Arc::new(FixedClassifier {
            noise_score: 0.0,
            calls: AtomicUsize::new(0),
        });
        relevance_filter(
            &ctx(Some(classifier.clone())),
            clauses(&["Click the button at the top of the page."]),
        );
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }
}
