//! Rule matcher: distill, embed, retrieve, threshold.

use termsguard_core::compliance::is_compliant_clause;
use termsguard_core::{CandidateMatch, Clause, DomainSet, Evidence, distill};
use termsguard_store::{Neighbor, Query, StoreError};
use tracing::{debug, info, warn};

use crate::{AnalysisContext, AnalysisError};

/// Candidate (clause, rule) pairs within the distance threshold.
///
/// Candidates follow clause input order, ascending distance within a clause.
/// `CandidateMatch::id` is the position in the returned list.
pub async fn match_clauses(
    ctx: &AnalysisContext,
    clauses: &[Clause],
) -> Result<Vec<CandidateMatch>, AnalysisError> {
    let mut queries: Vec<(&Clause, String)> = Vec::with_capacity(clauses.len());
    for clause in clauses {
        if ctx.config.compliance_guard && is_compliant_clause(clause) {
            debug!(clause_id = %clause.id, "clause already phrased compliantly, skipped");
            continue;
        }
        let distillate = distill(ctx.tagger.as_ref(), &clause.text);
        if distillate.is_empty() {
            debug!(clause_id = %clause.id, "empty distillate, skipped");
            continue;
        }
        queries.push((clause, distillate));
    }
    if queries.is_empty() {
        return Ok(Vec::new());
    }

    let texts: Vec<&str> = queries.iter().map(|(_, d)| d.as_str()).collect();
    let vectors = ctx
        .embedder
        .embed_batch(&texts)
        .map_err(AnalysisError::Embedding)?;
    if vectors.len() != queries.len() {
        return Err(AnalysisError::Context(format!(
            "embedder returned {} vectors for {} clauses",
            vectors.len(),
            queries.len()
        )));
    }

    let clauses_queried: Vec<&Clause> = queries.iter().map(|(clause, _)| *clause).collect();
    let results = search_all(ctx, &clauses_queried, &vectors).await?;

    let mut candidates = Vec::new();
    for (clause, result) in clauses_queried.iter().zip(results) {
        let mut neighbors = result?;
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        for neighbor in neighbors {
            if neighbor.distance > ctx.config.distance_threshold {
                continue;
            }
            let Some(rule) = ctx.rules.get(&neighbor.rule_id) else {
                warn!(rule_id = %neighbor.rule_id, "index returned a rule missing from the rule set");
                continue;
            };
            let matched_domains: DomainSet =
                clause.domains.intersection(&rule.domains).copied().collect();
            candidates.push(CandidateMatch {
                id: candidates.len(),
                clause_id: clause.id.clone(),
                rule_id: rule.rule_id.clone(),
                distance: neighbor.distance,
                evidence: Evidence {
                    clause_text: clause.text.clone(),
                    law_excerpt: rule.raw_law.clone(),
                    matched_domains: matched_domains.clone(),
                },
                matched_domains,
            });
        }
    }

    info!(
        clauses = clauses.len(),
        queried = queries.len(),
        candidates = candidates.len(),
        "rule matching done"
    );
    Ok(candidates)
}

/// Domain-prefiltered search for every clause in one index call. Clauses
/// whose filter the index rejects are re-queried unfiltered in a second call.
async fn search_all(
    ctx: &AnalysisContext,
    clauses: &[&Clause],
    vectors: &[Vec<f32>],
) -> Result<Vec<Result<Vec<Neighbor>, StoreError>>, AnalysisError> {
    let k = ctx.config.top_k;
    let batch: Vec<Query<'_>> = clauses
        .iter()
        .zip(vectors)
        .map(|(clause, vector)| Query {
            vector,
            filter: (!clause.domains.is_empty()).then_some(&clause.domains),
        })
        .collect();
    let mut results = ctx.index.search_many(&batch, k).await;
    check_len(results.len(), batch.len())?;

    let rejected: Vec<usize> = results
        .iter()
        .enumerate()
        .filter(|(i, result)| {
            batch[*i].filter.is_some()
                && matches!(
                    result,
                    Err(StoreError::FilterRejected(_) | StoreError::Other(_))
                )
        })
        .map(|(i, _)| i)
        .collect();
    if rejected.is_empty() {
        return Ok(results);
    }

    for &i in &rejected {
        if let Err(e) = &results[i] {
            warn!(clause_id = %clauses[i].id, error = %e, "domain prefilter rejected, retrying unfiltered");
        }
    }
    let retry: Vec<Query<'_>> = rejected
        .iter()
        .map(|&i| Query {
            vector: batch[i].vector,
            filter: None,
        })
        .collect();
    let retried = ctx.index.search_many(&retry, k).await;
    check_len(retried.len(), retry.len())?;
    for (i, result) in rejected.into_iter().zip(retried) {
        results[i] = result;
    }
    Ok(results)
}

fn check_len(returned: usize, sent: usize) -> Result<(), AnalysisError> {
    if returned != sent {
        return Err(AnalysisError::Context(format!(
            "index returned {returned} results for {sent} queries"
        )));
    }
    Ok(())
}
