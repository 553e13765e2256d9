//! Keyword ontology: maps free text to legal domains.
//!
//! Built once from a keyword table into a reverse index (keyword → domain) and
//! a single case-insensitive alternation. Keywords are sorted longest-first so
//! multi-word phrases win over the shorter keywords they contain, and every
//! alternative is anchored on word boundaries so "age" never fires inside
//! "page".

use std::collections::{BTreeMap, HashMap};

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::domain::{Domain, DomainSet, KEYWORD_TABLE};

/// Immutable keyword → domain index with its compiled matcher.
#[derive(Debug, Clone)]
pub struct OntologyIndex {
    keyword_to_domain: HashMap<String, Domain>,
    domain_keywords: BTreeMap<Domain, Vec<String>>,
    pattern: Regex,
}

impl OntologyIndex {
    /// Build the index over the built-in [`KEYWORD_TABLE`].
    pub fn builtin() -> Result<Self, regex::Error> {
        Self::from_table(KEYWORD_TABLE)
    }

    /// Build the index over a custom keyword table.
    pub fn from_table(table: &[(Domain, &[&str])]) -> Result<Self, regex::Error> {
        let mut keyword_to_domain = HashMap::new();
        let mut domain_keywords: BTreeMap<Domain, Vec<String>> = BTreeMap::new();

        for (domain, keywords) in table {
            for kw in *keywords {
                let lower = kw.trim().to_lowercase();
                if lower.is_empty() {
                    continue;
                }
                if let Some(previous) = keyword_to_domain.insert(lower.clone(), *domain)
                    && previous != *domain
                {
                    debug!(keyword = %lower, from = %previous, to = %domain, "keyword reassigned");
                }
                domain_keywords.entry(*domain).or_default().push(lower);
            }
        }

        let mut sorted: Vec<&str> = keyword_to_domain.keys().map(String::as_str).collect();
        // Longest first; ties broken alphabetically so the pattern is stable.
        sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternation = sorted
            .iter()
            .map(|kw| regex::escape(kw))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
            .case_insensitive(true)
            .build()?;

        Ok(Self {
            keyword_to_domain,
            domain_keywords,
            pattern,
        })
    }

    /// All keyword occurrences in `text`, lowercased, in text order.
    pub fn matches(&self, text: &str) -> Vec<String> {
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect()
    }

    /// Distinct domains whose keywords appear in `text`. Empty means untagged.
    pub fn tag(&self, text: &str) -> DomainSet {
        self.pattern
            .find_iter(text)
            .filter_map(|m| self.lookup(m.as_str()))
            .collect()
    }

    /// Domain a single keyword resolves to.
    pub fn lookup(&self, keyword: &str) -> Option<Domain> {
        self.keyword_to_domain
            .get(&keyword.to_lowercase())
            .copied()
    }

    /// Keywords listed for `domain`, lowercased, in table order.
    pub fn keywords_for(&self, domain: Domain) -> &[String] {
        self.domain_keywords
            .get(&domain)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct keywords in the reverse index.
    pub fn len(&self) -> usize {
        self.keyword_to_domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyword_to_domain.is_empty()
    }
}
