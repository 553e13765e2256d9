//! Human-readable report rendering.
//!
//! Renders an [`AnalysisResult`] as a vertical card grouped by section, in the
//! order a reviewer reads it: verdict, summary, each violation, risks.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use termsguard_core::{AnalysisResult, DomainSet, Outcome, Violation};

const MAX_TEXT_CHARS: usize = 160;

// ── Public API ──

pub fn print_report(result: &AnalysisResult, generated_at: DateTime<Utc>) {
    print!("{}", render_report(result, generated_at));
}

pub fn print_tagged_clause(n: usize, text: &str, domains: &DomainSet, hits: &[String]) {
    println!("[{n}] {}", truncate(text));
    if domains.is_empty() {
        println!("    {:<10} (none)", "domains");
        return;
    }
    let labels: Vec<&str> = domains.iter().map(|d| d.as_str()).collect();
    println!("    {:<10} {}", "domains", labels.join(", "));
    println!("    {:<10} {}", "keywords", hits.join(", "));
}

pub fn render_report(result: &AnalysisResult, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_report(&mut out, result, generated_at);
    out
}

// ── Section rendering ──

fn write_report(
    out: &mut String,
    result: &AnalysisResult,
    generated_at: DateTime<Utc>,
) -> std::fmt::Result {
    writeln!(out, "=== termsguard report ===")?;
    writeln!(out, "  {:<18} {}", "generated", generated_at.to_rfc3339())?;
    writeln!(out, "  {:<18} {}", "outcome", outcome_label(&result.outcome))?;
    writeln!(out, "  {:<18} {}", "overall severity", result.overall_severity)?;
    let c = &result.counts;
    writeln!(
        out,
        "  {:<18} {} (critical {}, high {}, medium {}, low {})",
        "violations", c.total, c.critical, c.high, c.medium, c.low
    )?;
    writeln!(out)?;

    writeln!(out, "Summary")?;
    writeln!(out, "  {}", result.summary)?;
    if let Outcome::Unadjudicated { error } = &result.outcome {
        writeln!(out, "  Adjudication failed: {error}")?;
        writeln!(out, "  Violations below are unverified candidate matches.")?;
    }
    writeln!(out)?;

    if !result.violations.is_empty() {
        writeln!(out, "Violations")?;
        for v in &result.violations {
            write_violation(out, v)?;
        }
        writeln!(out)?;
    }

    if !result.future_risks.is_empty() {
        writeln!(out, "Future risks")?;
        for r in &result.future_risks {
            writeln!(out, "  {:.2}  {}", r.confidence, r.risk)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_violation(out: &mut String, v: &Violation) -> std::fmt::Result {
    writeln!(
        out,
        "  [{}] {}  confidence {:.2}  distance {:.3}",
        v.severity, v.rule_id, v.confidence, v.distance
    )?;
    writeln!(out, "    {:<10} {}", "clause", truncate(&v.evidence.clause_text))?;
    writeln!(out, "    {:<10} {}", "law", truncate(&v.evidence.law_excerpt))?;
    if !v.evidence.matched_domains.is_empty() {
        let labels: Vec<&str> = v.evidence.matched_domains.iter().map(|d| d.as_str()).collect();
        writeln!(out, "    {:<10} {}", "domains", labels.join(", "))?;
    }
    if let Some(reason) = &v.reason {
        writeln!(out, "    {:<10} {}", "reason", reason)?;
    }
    Ok(())
}

fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::NoClauses => "no analyzable clauses",
        Outcome::NoMatches => "no matching rules",
        Outcome::Adjudicated => "adjudicated",
        Outcome::Unadjudicated { .. } => "unadjudicated",
    }
}

fn truncate(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(MAX_TEXT_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
