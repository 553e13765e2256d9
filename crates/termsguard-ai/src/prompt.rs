//! Adjudication prompt.

use std::fmt::Write;

use termsguard_core::CandidateMatch;

/// Fixed instructions preceding the enumerated candidates.
pub const SYSTEM_PROMPT: &str = r#"You review Terms of Service and Privacy Policy clauses for compliance with the laws quoted below.

Each item has this form:

id: <int>
TOS_text: <clause from the document>
Matched_law: <law the clause was matched against>

For every item, in the order given, emit exactly one object
{"id": <int>, "violated": <bool>, "irrelevant": <bool>, "reason": "<one line>"}.
The number of objects must equal the number of items.

Verdicts:
1. violated = true, irrelevant = false: the clause breaches the law.
2. violated = false, irrelevant = false: the clause complies with the law.
3. violated = false, irrelevant = true: the clause and the law are unrelated.
"violated" and "irrelevant" must never both be true.

Reply with JSON only, no commentary:

{
  "analysis": [
    {"id": 1, "violated": false, "irrelevant": false, "reason": "..."}
  ],
  "summary": "One or two sentences summarising the violations found."
}

"#;

/// The full prompt for `candidates`, ids numbered from 1 in input order.
pub fn build_prompt(candidates: &[CandidateMatch]) -> String {
    let mut prompt = String::from(SYSTEM_PROMPT);
    prompt.push_str("INPUT:\n");
    for (i, candidate) in candidates.iter().enumerate() {
        // Writing to a String cannot fail.
        let _ = write!(
            prompt,
            "id: {}\nTOS_text: {}\nMatched_law: {}\n\n",
            i + 1,
            one_line(&candidate.evidence.clause_text),
            one_line(&candidate.evidence.law_excerpt),
        );
    }
    prompt.push_str("Output ONLY valid JSON.");
    prompt
}

fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
