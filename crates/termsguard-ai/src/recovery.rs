//! Structured-output recovery for adjudicator responses.
//!
//! Model output is free text that is usually, but not always, the JSON object
//! we asked for. Recovery is an ordered chain of transformations; the first
//! one that yields a well-typed [`RawResponse`] wins. Validation against the
//! request happens afterwards in [`validate`].

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use termsguard_core::{CandidateMatch, Verdict, VerdictKind};
use tracing::{debug, warn};

const DEFAULT_SUMMARY: &str = "Analysis complete.";

/// Which transformation produced the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RecoveryStage {
    Direct,
    Unfenced,
    Braces,
    Repaired,
    Salvaged,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawResponse {
    pub analysis: Vec<RawVerdict>,
    #[serde(default = "default_summary")]
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawVerdict {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub violated: bool,
    pub irrelevant: bool,
    #[serde(default)]
    pub reason: String,
}

fn default_summary() -> String {
    DEFAULT_SUMMARY.to_string()
}

static TRAILING_COMMA: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").ok());
static ANALYSIS_ARRAY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?s)"analysis"\s*:\s*(\[.*?\])"#).ok());
static SUMMARY_STRING: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#""summary"\s*:\s*"([^"]*)""#).ok());

/// Run the recovery chain over `text`.
pub fn recover(text: &str) -> Option<(RecoveryStage, RawResponse)> {
    if let Some(r) = parse(text) {
        return Some((RecoveryStage::Direct, r));
    }
    if let Some(r) = parse(strip_fence(text)) {
        return Some((RecoveryStage::Unfenced, r));
    }
    let braces = outer_braces(text);
    if let Some(r) = braces.and_then(parse) {
        return Some((RecoveryStage::Braces, r));
    }
    if let Some(r) = braces.and_then(repair) {
        return Some((RecoveryStage::Repaired, r));
    }
    salvage(text).map(|r| (RecoveryStage::Salvaged, r))
}

fn parse(text: &str) -> Option<RawResponse> {
    serde_json::from_str(text).ok()
}

/// Drop a surrounding ```` ``` ```` or ```` ```json ```` fence.
fn strip_fence(text: &str) -> &str {
    let text = text.trim();
    let body = match text.strip_prefix("```") {
        Some(rest) => match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        },
        None => text,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// First `{` through last `}`.
fn outer_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Remove trailing commas, then also try single quotes as double quotes.
fn repair(text: &str) -> Option<RawResponse> {
    let fixed = TRAILING_COMMA.as_ref()?.replace_all(text, "$1");
    parse(&fixed).or_else(|| parse(&fixed.replace('\'', "\"")))
}

/// Pull out just the `analysis` array and the `summary` string.
fn salvage(text: &str) -> Option<RawResponse> {
    let array = ANALYSIS_ARRAY.as_ref()?.captures(text)?.get(1)?.as_str();
    let analysis: Vec<RawVerdict> = serde_json::from_str(array).ok()?;
    let summary = SUMMARY_STRING
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(default_summary);
    Some(RawResponse { analysis, summary })
}

/// Check a recovered response against the request and type it.
///
/// One verdict per candidate, in order. An `id`, when present, must be the
/// 1-based position. An item claiming both violated and irrelevant is
/// repaired to irrelevant.
pub fn validate(
    response: RawResponse,
    candidates: &[CandidateMatch],
) -> Result<(Vec<Verdict>, String), String> {
    if response.analysis.len() != candidates.len() {
        return Err(format!(
            "expected {} verdicts, got {}",
            candidates.len(),
            response.analysis.len()
        ));
    }

    let mut verdicts = Vec::with_capacity(candidates.len());
    for (pos, (raw, candidate)) in response.analysis.into_iter().zip(candidates).enumerate() {
        let expected_id = pos + 1;
        if let Some(id) = &raw.id
            && id_value(id) != Some(expected_id)
        {
            return Err(format!("verdict {expected_id} carries id {id}"));
        }

        let kind = match (raw.violated, raw.irrelevant) {
            (true, true) => {
                warn!(
                    id = expected_id,
                    rule_id = %candidate.rule_id,
                    "verdict claims both violated and irrelevant; treating as irrelevant"
                );
                VerdictKind::Irrelevant
            }
            (true, false) => VerdictKind::Violated,
            (false, true) => VerdictKind::Irrelevant,
            (false, false) => VerdictKind::Compliant,
        };
        verdicts.push(Verdict {
            candidate_id: candidate.id,
            kind,
            reason: raw.reason.trim().to_string(),
        });
    }
    debug!(verdicts = verdicts.len(), "validated adjudication");
    Ok((verdicts, response.summary))
}

fn id_value(id: &serde_json::Value) -> Option<usize> {
    match id {
        serde_json::Value::Number(n) => n.as_u64().map(|n| n as usize),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termsguard_core::{DomainSet, Evidence};

    const CLEAN: &str = r#"{"analysis": [{"id": 1, "violated": true, "irrelevant": false, "reason": "Keeps data forever."}], "summary": "One violation."}"#;

    fn candidates(n: usize) -> Vec<CandidateMatch> {
        (0..n)
            .map(|i| CandidateMatch {
                id: i,
                clause_id: format!("c{i}"),
                rule_id: format!("r{i}"),
                distance: 0.1,
                matched_domains: DomainSet::new(),
                evidence: Evidence {
                    clause_text: "clause".into(),
                    law_excerpt: "law".into(),
                    matched_domains: DomainSet::new(),
                },
            })
            .collect()
    }

    #[test]
    fn direct() {
        let (stage, r) = recover(CLEAN).unwrap();
        assert_eq!(stage, RecoveryStage::Direct);
        assert_eq!(r.summary, "One violation.");
        assert!(r.analysis[0].violated);
    }

    #[test]
    fn fenced() {
        let text = format!("```json\n{CLEAN}\n```");
        assert_eq!(recover(&text).unwrap().0, RecoveryStage::Unfenced);
    }

    #[test]
    fn surrounded_by_chatter() {
        let text = format!("Sure! Here is the result:\n{CLEAN}\nLet me know if you need more.");
        assert_eq!(recover(&text).unwrap().0, RecoveryStage::Braces);
    }

    #[test]
    fn fenced_with_trailing_comma() {
        let text = "```json\n{\"analysis\": [{\"id\": 1, \"violated\": true, \"irrelevant\": false, \"reason\": \"x\"},], \"summary\": \"s\",}\n```";
        let (stage, r) = recover(text).unwrap();
        assert_eq!(stage, RecoveryStage::Repaired);
        assert_eq!(r.analysis.len(), 1);
        assert_eq!(r.summary, "s");
    }

    #[test]
    fn single_quotes() {
        let text = "{'analysis': [{'id': 1, 'violated': false, 'irrelevant': true, 'reason': 'unrelated'}], 'summary': 'none'}";
        let (stage, r) = recover(text).unwrap();
        assert_eq!(stage, RecoveryStage::Repaired);
        assert!(r.analysis[0].irrelevant);
    }

    #[test]
    fn salvages_array_without_summary() {
        let text = r#"analysis follows "analysis": [{"id": 1, "violated": false, "irrelevant": true, "reason": "r"}] (truncated"#;
        let (stage, r) = recover(text).unwrap();
        assert_eq!(stage, RecoveryStage::Salvaged);
        assert_eq!(r.summary, "Analysis complete.");
    }

    #[test]
    fn fence_language_tag_is_case_insensitive() {
        let (stage, r) = recover(&format!("```JSON\n{CLEAN}\n```")).unwrap();
        assert_eq!(stage, RecoveryStage::Unfenced);
        assert_eq!(r.analysis.len(), 1);
        let (stage, _) = recover(&format!("```Json\n{CLEAN}\n```")).unwrap();
        assert_eq!(stage, RecoveryStage::Unfenced);
    }

    #[test]
    fn verdict_without_flags_is_unrecoverable() {
        let missing = r#"{"analysis": [{"id": 1, "reason": "unclear"}], "summary": "s"}"#;
        assert!(recover(missing).is_none());
        let salvage_only = r#"cut off "analysis": [{"id": 1, "reason": "r"}] (truncated"#;
        assert!(recover(salvage_only).is_none());
        let one_flag = r#"{"analysis": [{"id": 1, "violated": true, "reason": "r"}]}"#;
        assert!(recover(one_flag).is_none());
    }

    #[test]
    fn unrecoverable() {
        assert!(recover("I cannot help with that.").is_none());
        assert!(recover("").is_none());
        assert!(recover(r#"{"result": "ok"}"#).is_none());
    }

    #[test]
    fn validate_maps_kinds_in_order() {
        let raw: RawResponse = serde_json::from_str(
            r#"{"analysis": [
                {"id": 1, "violated": true, "irrelevant": false, "reason": "a"},
                {"id": "2", "violated": false, "irrelevant": false, "reason": "b"},
                {"violated": false, "irrelevant": true, "reason": "c"}
            ], "summary": "s"}"#,
        )
        .unwrap();
        let (verdicts, summary) = validate(raw, &candidates(3)).unwrap();
        let kinds: Vec<VerdictKind> = verdicts.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                VerdictKind::Violated,
                VerdictKind::Compliant,
                VerdictKind::Irrelevant
            ]
        );
        assert_eq!(verdicts[2].candidate_id, 2);
        assert_eq!(summary, "s");
    }

    #[test]
    fn validate_repairs_violated_and_irrelevant() {
        let raw: RawResponse = serde_json::from_str(
            r#"{"analysis": [{"id": 1, "violated": true, "irrelevant": true, "reason": "?"}]}"#,
        )
        .unwrap();
        let (verdicts, _) = validate(raw, &candidates(1)).unwrap();
        assert_eq!(verdicts[0].kind, VerdictKind::Irrelevant);
        assert!(!(verdicts[0].violated() && verdicts[0].irrelevant()));
    }

    #[test]
    fn validate_rejects_count_mismatch() {
        let (_, raw) = recover(CLEAN).unwrap();
        assert!(validate(raw, &candidates(2)).is_err());
    }

    #[test]
    fn validate_rejects_out_of_order_ids() {
        let raw: RawResponse = serde_json::from_str(
            r#"{"analysis": [
                {"id": 2, "violated": true, "irrelevant": false, "reason": "a"},
                {"id": 1, "violated": true, "irrelevant": false, "reason": "b"}
            ]}"#,
        )
        .unwrap();
        assert!(validate(raw, &candidates(2)).is_err());
    }
}
