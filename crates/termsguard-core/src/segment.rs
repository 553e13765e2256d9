//! Clause segmentation.
//!
//! Splits raw document text into candidate clauses, dropping fragments too
//! short to carry an obligation (headers, list markers) and definitional
//! sentences, which describe vocabulary rather than obligations.

use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

use crate::config::SegmenterMode;
use crate::types::Clause;

/// Split `text` into untagged clauses, each with a fresh random id.
pub fn segment(text: &str, mode: SegmenterMode, min_chars: usize) -> Vec<Clause> {
    split_sentences(text, mode)
        .into_iter()
        .map(str::trim)
        .filter(|s| s.chars().count() >= min_chars)
        .filter(|s| !is_definition(s))
        .map(|s| Clause::new(Uuid::new_v4().to_string(), s))
        .collect()
}

/// Sentence fragments of `text`, untrimmed, in document order.
pub fn split_sentences(text: &str, mode: SegmenterMode) -> Vec<&str> {
    match mode {
        SegmenterMode::Sentences => text.split_sentence_bounds().collect(),
        SegmenterMode::Periods => text.split(". ").collect(),
    }
}

/// Definitional sentences use the word "means" ("Personal Data means ...").
pub fn is_definition(sentence: &str) -> bool {
    sentence
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| w.eq_ignore_ascii_case("means"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: &str = "Overview. We collect your email address when you register. \
        \"Personal Data\" means any information relating to you. \
        We retain usage logs for 180 days.";

    #[test]
    fn drops_short_fragments_and_definitions() {
        let clauses = segment(POLICY, SegmenterMode::Sentences, 15);
        let texts: Vec<&str> = clauses.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "We collect your email address when you register.",
                "We retain usage logs for 180 days.",
            ]
        );
    }

    #[test]
    fn period_heuristic() {
        let clauses = segment(POLICY, SegmenterMode::Periods, 15);
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].text, "We collect your email address when you register");
    }

    #[test]
    fn ids_are_unique() {
        let clauses = segment(POLICY, SegmenterMode::Sentences, 15);
        assert_ne!(clauses[0].id, clauses[1].id);
    }

    #[test]
    fn texts_are_stable_across_runs() {
        let a: Vec<String> = segment(POLICY, SegmenterMode::Sentences, 15)
            .into_iter()
            .map(|c| c.text)
            .collect();
        let b: Vec<String> = segment(POLICY, SegmenterMode::Sentences, 15)
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn definition_detection_is_whole_word() {
        assert!(is_definition("\"Service\" MEANS the platform."));
        assert!(!is_definition("We use meanstack tooling for our website."));
    }

    #[test]
    fn empty_text() {
        assert!(segment("", SegmenterMode::Sentences, 15).is_empty());
        assert!(segment("   ", SegmenterMode::Periods, 15).is_empty());
    }
}
