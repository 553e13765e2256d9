//! Phrasings that already satisfy a domain's usual obligation.

use crate::domain::Domain;
use crate::types::Clause;

pub const COMPLIANT_PATTERNS: &[(Domain, &[&str])] = &[
    (
        Domain::DataCollection,
        &["only with consent", "with user consent", "after consent"],
    ),
    (
        Domain::DataRetention,
        &["deleted once", "erase after", "retained only as long as necessary"],
    ),
];

/// True when the clause carries a guarded domain and uses one of its compliant
/// phrasings (case-insensitive substring).
pub fn is_compliant_clause(clause: &Clause) -> bool {
    let text = clause.text.to_lowercase();
    COMPLIANT_PATTERNS.iter().any(|(domain, phrases)| {
        clause.domains.contains(domain) && phrases.iter().any(|p| text.contains(p))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_with_consent() {
        let c = Clause::new("c", "We collect location data Only With Consent.")
            .with_domains([Domain::DataCollection].into());
        assert!(is_compliant_clause(&c));
    }

    #[test]
    fn phrase_needs_matching_domain() {
        let c = Clause::new("c", "Records are deleted once the account closes.")
            .with_domains([Domain::DataSharing].into());
        assert!(!is_compliant_clause(&c));

        let c = c.with_domains([Domain::DataRetention].into());
        assert!(is_compliant_clause(&c));
    }

    #[test]
    fn plain_retention_is_not_compliant() {
        let c = Clause::new("c", "We retain data indefinitely.")
            .with_domains([Domain::DataRetention].into());
        assert!(!is_compliant_clause(&c));
    }
}
