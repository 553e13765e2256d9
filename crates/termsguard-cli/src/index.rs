//! Rule indexing pipeline: loads the rule corpus, embeds every rationale, writes
//! the LanceDB `rules` table.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use termsguard_core::Rule;
use termsguard_store::{LanceRuleIndex, RuleSet};

use crate::ModelArgs;
use crate::setup::load_embedder;

const EMBED_BATCH_SIZE: usize = 256;

pub struct IndexStats {
    pub rows: usize,
    pub elapsed_secs: f64,
}

pub async fn run_index_pipeline(models: &ModelArgs, out: &Path) -> anyhow::Result<IndexStats> {
    let start = Instant::now();

    let rules = RuleSet::load(&models.rules)
        .with_context(|| format!("loading rules from {}", models.rules.display()))?;
    eprintln!("  Read {} rules from {}", rules.len(), models.rules.display());

    let embedder = load_embedder(models.model_dir.as_deref())?;
    let texts: Vec<&str> = rules.iter().map(|r| r.rationale.as_str()).collect();
    let mut vectors = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(EMBED_BATCH_SIZE) {
        let batch = embedder
            .embed_batch(chunk)
            .context("embedding rule rationales")?;
        vectors.extend(batch);
        eprint!("\r  Embedded {}/{}", vectors.len(), texts.len());
    }
    eprintln!();

    eprintln!("  Writing to LanceDB...");
    let rules: Vec<Rule> = rules.iter().cloned().collect();
    let index = LanceRuleIndex::build(out, &rules, &vectors, embedder.dim())
        .await
        .context("writing rule table to LanceDB")?;
    let rows = index.count().await.context("counting indexed rules")?;

    Ok(IndexStats {
        rows,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}
