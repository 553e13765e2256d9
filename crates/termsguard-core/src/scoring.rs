//! Per-match confidence and per-document severity.

use crate::config::{ConfidenceLadder, SeverityPolicy};
use crate::ontology::OntologyIndex;
use crate::types::{Clause, Rule, Severity};

/// Confidence that a candidate match is real, highest applicable rung wins.
///
/// The top rung fires when a keyword of one of the rule's domains, or the
/// domain label itself, appears in the clause text as a whole word. A keyword
/// listed under several domains counts for each of them.
pub fn match_confidence(
    ontology: &OntologyIndex,
    ladder: &ConfidenceLadder,
    clause: &Clause,
    rule: &Rule,
) -> f32 {
    let hits = ontology.matches(&clause.text);
    let text = clause.text.to_lowercase();
    let keyword_hit = rule.domains.iter().any(|domain| {
        let label = domain.as_str().to_lowercase().replace('_', " ");
        let keywords = ontology.keywords_for(*domain);
        text.contains(&label) || hits.iter().any(|kw| keywords.contains(kw))
    });

    if keyword_hit {
        ladder.keyword
    } else if !clause.domains.is_empty() {
        ladder.tagged
    } else {
        ladder.structural
    }
}

impl SeverityPolicy {
    /// Aggregate violation severities into one document severity.
    /// No violations always yields [`Severity::Low`].
    pub fn overall<'a>(&self, severities: impl IntoIterator<Item = &'a Severity>) -> Severity {
        match self {
            Self::Dominance => severities.into_iter().max().copied().unwrap_or(Severity::Low),
            Self::WeightedSum => {
                let score: u32 = severities.into_iter().map(|s| weight(*s)).sum();
                match score {
                    s if s >= 20 => Severity::Critical,
                    s if s >= 10 => Severity::High,
                    s if s >= 5 => Severity::Medium,
                    _ => Severity::Low,
                }
            }
        }
    }
}

fn weight(severity: Severity) -> u32 {
    match severity {
        Severity::Low => 1,
        Severity::Medium => 2,
        Severity::High => 3,
        Severity::Critical => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;

    fn rule(domains: &[Domain]) -> Rule {
        Rule {
            rule_id: "R1".into(),
            domains: domains.iter().copied().collect(),
            severity: Severity::High,
            raw_law: "s.8(7)".into(),
            rationale: "Erase data once the purpose is served.".into(),
        }
    }

    fn clause(text: &str, domains: &[Domain]) -> Clause {
        Clause::new("c1", text).with_domains(domains.iter().copied().collect())
    }

    #[test]
    fn keyword_rung() {
        let idx = OntologyIndex::builtin().unwrap();
        let c = clause("We retain data indefinitely.", &[Domain::DataRetention]);
        let conf = match_confidence(
            &idx,
            &ConfidenceLadder::default(),
            &c,
            &rule(&[Domain::DataRetention]),
        );
        assert_eq!(conf, 0.9);
    }

    #[test]
    fn shared_keyword_counts_for_every_listing_domain() {
        let idx = OntologyIndex::builtin().unwrap();
        // "withdraw" resolves to USER_RIGHTS in the reverse index but is also
        // a CONSENT keyword.
        let c = clause("You may withdraw at any time.", &[Domain::UserRights]);
        assert_eq!(idx.lookup("withdraw"), Some(Domain::UserRights));
        let conf = match_confidence(
            &idx,
            &ConfidenceLadder::default(),
            &c,
            &rule(&[Domain::Consent]),
        );
        assert_eq!(conf, 0.9);
    }

    #[test]
    fn domain_label_in_text_counts() {
        let idx = OntologyIndex::builtin().unwrap();
        let c = clause("Nothing here but consent.", &[]);
        let conf = match_confidence(
            &idx,
            &ConfidenceLadder::default(),
            &c,
            &rule(&[Domain::Consent]),
        );
        assert_eq!(conf, 0.9);
    }

    #[test]
    fn tagged_rung() {
        let idx = OntologyIndex::builtin().unwrap();
        let c = clause("We retain data indefinitely.", &[Domain::DataRetention]);
        let conf = match_confidence(
            &idx,
            &ConfidenceLadder::default(),
            &c,
            &rule(&[Domain::ChildrenData]),
        );
        assert_eq!(conf, 0.6);
    }

    #[test]
    fn structural_rung() {
        let idx = OntologyIndex::builtin().unwrap();
        let c = clause("The quick brown fox jumps.", &[]);
        let conf = match_confidence(
            &idx,
            &ConfidenceLadder::default(),
            &c,
            &rule(&[Domain::Liability]),
        );
        assert_eq!(conf, 0.4);
    }

    #[test]
    fn empty_is_low_under_both_policies() {
        let none: [Severity; 0] = [];
        assert_eq!(SeverityPolicy::Dominance.overall(&none), Severity::Low);
        assert_eq!(SeverityPolicy::WeightedSum.overall(&none), Severity::Low);
    }

    #[test]
    fn dominance() {
        use Severity::*;
        assert_eq!(SeverityPolicy::Dominance.overall(&[Low]), Low);
        assert_eq!(SeverityPolicy::Dominance.overall(&[Medium, Low]), Medium);
        assert_eq!(SeverityPolicy::Dominance.overall(&[Critical, High, High]), Critical);
        // One critical finding is never diluted by many low ones.
        assert_eq!(SeverityPolicy::Dominance.overall(&[Low, Low, Low, Critical]), Critical);
    }

    #[test]
    fn weighted_sum_buckets() {
        use Severity::*;
        assert_eq!(SeverityPolicy::WeightedSum.overall(&[Critical]), Medium);
        assert_eq!(SeverityPolicy::WeightedSum.overall(&[Critical, High, High]), High);
        assert_eq!(SeverityPolicy::WeightedSum.overall(&[Critical; 4]), Critical);
        assert_eq!(SeverityPolicy::WeightedSum.overall(&[Low, Low, Medium]), Low);
    }
}
