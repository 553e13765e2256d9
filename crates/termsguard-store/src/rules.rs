//! Rule corpus loader.
//!
//! The corpus is a JSON array of
//! `{rule_id, domain: [string] | string, severity, raw_law, rationale}`.
//! Labels are canonicalized once here so the rest of the pipeline only ever
//! sees typed [`Rule`] values.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use termsguard_core::{Domain, DomainSet, Rule, Severity};
use tracing::info;

use crate::StoreError;

/// Remove trailing `[cite: ...]` markers from a rationale, repeatedly.
pub fn clean_rationale(text: &str) -> String {
    let mut cleaned = text.trim();
    while let Some(rest) = strip_trailing_cite(cleaned) {
        cleaned = rest;
    }
    cleaned.to_string()
}

/// `"... [cite: 4]."` without the marker, or `None` if it does not end in one.
fn strip_trailing_cite(text: &str) -> Option<&str> {
    let text = text.trim_end();
    let text = text.strip_suffix('.').unwrap_or(text).trim_end();
    let body = text.strip_suffix(']')?;
    let start = body.rfind("[cite:")?;
    if body[start..].contains(']') {
        return None;
    }
    Some(body[..start].trim_end())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Labels {
    Many(Vec<String>),
    One(String),
}

impl Default for Labels {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl Labels {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::Many(v) => v,
            // Older corpora store "A, B" in a single string.
            Self::One(s) => s
                .split(',')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRule {
    #[serde(default)]
    rule_id: Option<String>,
    #[serde(default)]
    domain: Labels,
    severity: String,
    #[serde(default)]
    raw_law: String,
    #[serde(default)]
    rationale: String,
}

/// Read-only rule corpus with lookup by id. Order is file order.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
    by_id: HashMap<String, usize>,
}

impl RuleSet {
    /// Load and normalize a rule file. Every defect is fatal.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let set = Self::from_json(&raw)?;
        info!(path = %path.display(), rules = set.len(), "loaded rule corpus");
        Ok(set)
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let raw: Vec<RawRule> = serde_json::from_str(json)?;
        let rules = raw
            .into_iter()
            .enumerate()
            .map(|(pos, r)| normalize(pos, r))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rules(rules)
    }

    pub fn from_rules(rules: Vec<Rule>) -> Result<Self, StoreError> {
        if rules.is_empty() {
            return Err(StoreError::Empty);
        }
        let mut by_id = HashMap::with_capacity(rules.len());
        for (i, rule) in rules.iter().enumerate() {
            if by_id.insert(rule.rule_id.clone(), i).is_some() {
                return Err(StoreError::DuplicateRule(rule.rule_id.clone()));
            }
        }
        Ok(Self { rules, by_id })
    }

    pub fn get(&self, rule_id: &str) -> Option<&Rule> {
        self.by_id.get(rule_id).map(|&i| &self.rules[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn normalize(pos: usize, raw: RawRule) -> Result<Rule, StoreError> {
    let rule_id = raw
        .rule_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(StoreError::MissingId(pos))?;

    let domains = raw
        .domain
        .into_vec()
        .iter()
        .map(|label| label.parse::<Domain>())
        .collect::<Result<DomainSet, _>>()
        .map_err(|source| StoreError::UnknownDomain {
            rule_id: rule_id.clone(),
            source,
        })?;

    let severity = raw
        .severity
        .parse::<Severity>()
        .map_err(|source| StoreError::UnknownSeverity {
            rule_id: rule_id.clone(),
            source,
        })?;

    Ok(Rule {
        rule_id,
        domains,
        severity,
        raw_law: raw.raw_law.trim().to_string(),
        rationale: clean_rationale(&raw.rationale),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CORPUS: &str = r#"[
        {"rule_id": "DPDP-8-7", "domain": [" Data_Retention ", "user-rights"], "severity": "high",
         "raw_law": "DPDP Act s.8(7)", "rationale": "Erase personal data once the purpose is served. [cite: 12]"},
        {"rule_id": "IT-43A", "domain": "SECURITY_PRACTICES, SENSITIVE_DATA", "severity": "CRITICAL",
         "raw_law": "IT Act s.43A", "rationale": "Maintain reasonable security practices."}
    ]"#;

    #[test]
    fn strips_trailing_citations() {
        assert_eq!(
            clean_rationale("Erase data. [cite: 12] [cite: 13]."),
            "Erase data."
        );
        assert_eq!(clean_rationale("  No citation here  "), "No citation here");
        assert_eq!(
            clean_rationale("See [cite: 4] for details."),
            "See [cite: 4] for details."
        );
    }

    #[test]
    fn normalizes_labels_and_severity() {
        let set = RuleSet::from_json(CORPUS).unwrap();
        assert_eq!(set.len(), 2);

        let rule = set.get("DPDP-8-7").unwrap();
        assert_eq!(
            rule.domains,
            DomainSet::from([Domain::DataRetention, Domain::UserRights])
        );
        assert_eq!(rule.severity, Severity::High);
        assert_eq!(rule.rationale, "Erase personal data once the purpose is served.");

        let rule = set.get("IT-43A").unwrap();
        assert_eq!(rule.severity, Severity::Critical);
        assert!(rule.domains.contains(&Domain::SensitiveData));
    }

    #[test]
    fn preserves_file_order() {
        let set = RuleSet::from_json(CORPUS).unwrap();
        let ids: Vec<&str> = set.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["DPDP-8-7", "IT-43A"]);
    }

    #[test]
    fn rejects_unknown_domain() {
        let json = r#"[{"rule_id": "X", "domain": ["ASTROLOGY"], "severity": "LOW"}]"#;
        let err = RuleSet::from_json(json).unwrap_err();
        assert!(matches!(err, StoreError::UnknownDomain { ref rule_id, .. } if rule_id == "X"));
    }

    #[test]
    fn rejects_unknown_severity() {
        let json = r#"[{"rule_id": "X", "domain": ["CONSENT"], "severity": "SEVERE"}]"#;
        assert!(matches!(
            RuleSet::from_json(json),
            Err(StoreError::UnknownSeverity { .. })
        ));
    }

    #[test]
    fn rejects_duplicates_and_empty() {
        let json = r#"[
            {"rule_id": "X", "domain": ["CONSENT"], "severity": "LOW"},
            {"rule_id": "X", "domain": ["CONSENT"], "severity": "LOW"}
        ]"#;
        assert!(matches!(
            RuleSet::from_json(json),
            Err(StoreError::DuplicateRule(id)) if id == "X"
        ));
        assert!(matches!(RuleSet::from_json("[]"), Err(StoreError::Empty)));
    }

    #[test]
    fn rejects_missing_id() {
        let json = r#"[{"domain": ["CONSENT"], "severity": "LOW"}]"#;
        assert!(matches!(RuleSet::from_json(json), Err(StoreError::MissingId(0))));
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            RuleSet::from_json("{not json"),
            Err(StoreError::Json(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CORPUS.as_bytes()).unwrap();
        let set = RuleSet::load(file.path()).unwrap();
        assert_eq!(set.len(), 2);

        let err = RuleSet::load(Path::new("/nonexistent/db.json")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn bundled_corpus_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/rules.json");
        let set = RuleSet::load(&path).unwrap();
        assert!(set.len() >= 8);
        for rule in &set {
            assert!(!rule.domains.is_empty(), "{} has no domains", rule.rule_id);
            assert!(!rule.rationale.contains("[cite:"), "{}", rule.rule_id);
        }
        let sharing = set.get("DPDP-8-2").unwrap();
        assert!(sharing.domains.contains(&Domain::DataSharing));
        assert!(sharing.domains.contains(&Domain::DataCollection));
    }
}
