//! Semantic distillation: reduce a clause to its legally load-bearing tokens.
//!
//! The distillate is the retrieval key. It keeps nouns, proper nouns, verbs
//! and numerals (retention periods matter), plus the negation and conditional
//! operators that flip legal meaning even though they are function words.

use std::collections::HashSet;

use crate::pos::PosTagger;

/// Function words retained because they invert or condition an obligation.
pub const LEGAL_OPERATORS: &[&str] = &["not", "no", "never", "only", "unless", "except", "if", "then"];

/// Lemmas that carry no legal content even when tagged as verbs.
pub const EMPTY_VERBS: &[&str] = &["be", "have", "occur", "apply"];

/// Distill `text` into a space-joined lemma string.
///
/// Content lemmas are deduplicated in first-occurrence order; legal operators
/// are kept at every occurrence. An empty result means the clause carries no
/// reliable retrieval signal.
pub fn distill(tagger: &dyn PosTagger, text: &str) -> String {
    let mut seen = HashSet::new();
    let mut out: Vec<String> = Vec::new();

    for token in tagger.tag(text) {
        let is_operator = LEGAL_OPERATORS.contains(&token.text.to_lowercase().as_str());
        if !(token.pos.is_content() || is_operator) {
            continue;
        }
        let lemma = token.lemma.to_lowercase();
        if EMPTY_VERBS.contains(&lemma.as_str()) {
            continue;
        }
        if LEGAL_OPERATORS.contains(&lemma.as_str()) || seen.insert(lemma.clone()) {
            out.push(lemma);
        }
    }

    out.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pos::HeuristicTagger;

    fn d(text: &str) -> String {
        distill(&HeuristicTagger, text)
    }

    #[test]
    fn keeps_content_and_operators() {
        assert_eq!(
            d("We will not share your data with advertisers unless you consent."),
            "not share data advertiser unless consent"
        );
    }

    #[test]
    fn keeps_numbers() {
        assert_eq!(d("Logs are retained for 180 days."), "log retain 180 day");
    }

    #[test]
    fn drops_empty_verbs() {
        assert_eq!(d("These terms apply to all users."), "term user");
    }

    #[test]
    fn deduplicates_content_but_not_operators() {
        assert_eq!(
            d("We never sell data and never sell data to brokers."),
            "never sell data never broker"
        );
    }

    #[test]
    fn idempotent() {
        for text in [
            "We will not share your data with advertisers unless you consent.",
            "If a transfer of any Customer Data from Salesforce to Supplier occurs then Section 3 shall apply.",
            "Supplier will not deliver tangible materials without advance written consent.",
            "Parental consent is required for children under 18.",
        ] {
            let once = d(text);
            assert_eq!(d(&once), once, "re-distilling {text:?}");
        }
    }

    #[test]
    fn empty_when_nothing_qualifies() {
        assert_eq!(d("It is what it is."), "");
        assert_eq!(d(""), "");
    }
}
