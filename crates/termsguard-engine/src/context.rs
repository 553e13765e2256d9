//! The immutable analysis context.
//!
//! Everything an analysis reads (config, ontology, rules, models, index) is
//! assembled once here and shared read-only. Independent contexts can coexist
//! in one process, e.g. one per tenant configuration.

use std::sync::Arc;

use termsguard_ai::{Adjudicator, AdjudicatorConfig, HashingEmbedder, NoiseClassifier, TextEmbedder};
use termsguard_core::{HeuristicTagger, OntologyIndex, PipelineConfig, PosTagger};
use termsguard_store::{MemoryIndex, NeighborIndex, RuleSet};
use tracing::info;

use crate::AnalysisError;

pub struct AnalysisContext {
    pub(crate) config: PipelineConfig,
    pub(crate) ontology: Arc<OntologyIndex>,
    pub(crate) rules: Arc<RuleSet>,
    pub(crate) tagger: Arc<dyn PosTagger>,
    pub(crate) embedder: Arc<dyn TextEmbedder>,
    pub(crate) index: Arc<dyn NeighborIndex>,
    pub(crate) noise: Option<Arc<dyn NoiseClassifier>>,
    pub(crate) adjudicator: Adjudicator,
}

impl AnalysisContext {
    pub fn builder(config: PipelineConfig, rules: Arc<RuleSet>) -> ContextBuilder {
        ContextBuilder {
            config,
            rules,
            ontology: None,
            tagger: None,
            embedder: None,
            index: None,
            noise: None,
            adjudicator: None,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn ontology(&self) -> &OntologyIndex {
        &self.ontology
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn tagger(&self) -> &dyn PosTagger {
        self.tagger.as_ref()
    }
}

/// Collects collaborators; anything not supplied gets the offline default.
pub struct ContextBuilder {
    config: PipelineConfig,
    rules: Arc<RuleSet>,
    ontology: Option<Arc<OntologyIndex>>,
    tagger: Option<Arc<dyn PosTagger>>,
    embedder: Option<Arc<dyn TextEmbedder>>,
    index: Option<Arc<dyn NeighborIndex>>,
    noise: Option<Arc<dyn NoiseClassifier>>,
    adjudicator: Option<Adjudicator>,
}

impl ContextBuilder {
    pub fn ontology(mut self, ontology: Arc<OntologyIndex>) -> Self {
        self.ontology = Some(ontology);
        self
    }

    pub fn tagger(mut self, tagger: Arc<dyn PosTagger>) -> Self {
        self.tagger = Some(tagger);
        self
    }

    pub fn embedder(mut self, embedder: Arc<dyn TextEmbedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// A prebuilt index. Without one, rule rationales are embedded into a
    /// [`MemoryIndex`] at build time.
    pub fn index(mut self, index: Arc<dyn NeighborIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn noise_classifier(mut self, noise: Arc<dyn NoiseClassifier>) -> Self {
        self.noise = Some(noise);
        self
    }

    pub fn adjudicator(mut self, adjudicator: Adjudicator) -> Self {
        self.adjudicator = Some(adjudicator);
        self
    }

    pub fn build(self) -> Result<AnalysisContext, AnalysisError> {
        self.config.validate()?;

        let ontology = match self.ontology {
            Some(o) => o,
            None => Arc::new(
                OntologyIndex::builtin()
                    .map_err(|e| AnalysisError::Context(format!("compile ontology: {e}")))?,
            ),
        };
        let embedder: Arc<dyn TextEmbedder> = self
            .embedder
            .unwrap_or_else(|| Arc::new(HashingEmbedder::default()));
        let index: Arc<dyn NeighborIndex> = match self.index {
            Some(index) => index,
            None => Arc::new(build_memory_index(&self.rules, embedder.as_ref())?),
        };
        if index.dim() != embedder.dim() {
            return Err(AnalysisError::Context(format!(
                "embedder produces {}-dim vectors but the rule index holds {}-dim vectors",
                embedder.dim(),
                index.dim()
            )));
        }

        info!(
            rules = self.rules.len(),
            keywords = ontology.len(),
            dim = embedder.dim(),
            noise_gate = self.noise.is_some(),
            "analysis context ready"
        );
        Ok(AnalysisContext {
            config: self.config,
            ontology,
            rules: self.rules,
            tagger: self.tagger.unwrap_or_else(|| Arc::new(HeuristicTagger)),
            embedder,
            index,
            noise: self.noise,
            adjudicator: self
                .adjudicator
                .unwrap_or_else(|| Adjudicator::from_config(&AdjudicatorConfig::default())),
        })
    }
}

/// Embed every rule rationale once into an exact in-memory index.
pub fn build_memory_index(
    rules: &RuleSet,
    embedder: &dyn TextEmbedder,
) -> Result<MemoryIndex, AnalysisError> {
    let texts: Vec<&str> = rules.iter().map(|r| r.rationale.as_str()).collect();
    let vectors = embedder
        .embed_batch(&texts)
        .map_err(AnalysisError::Embedding)?;
    if vectors.len() != texts.len() {
        return Err(AnalysisError::Context(format!(
            "embedder returned {} vectors for {} rules",
            vectors.len(),
            texts.len()
        )));
    }

    let mut index = MemoryIndex::new(embedder.dim());
    for (rule, vector) in rules.iter().zip(vectors) {
        index.insert(rule.rule_id.clone(), rule.domains.clone(), vector)?;
    }
    info!(rules = index.len(), "built in-memory rule index");
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use termsguard_core::{Domain, Rule, Severity};

    fn rules() -> Arc<RuleSet> {
        Arc::new(
            RuleSet::from_rules(vec![Rule {
                rule_id: "R1".into(),
                domains: [Domain::DataRetention].into(),
                severity: Severity::High,
                raw_law: "s.8(7)".into(),
                rationale: "erase data purpose served".into(),
            }])
            .unwrap(),
        )
    }

    #[test]
    fn builds_with_defaults() {
        let ctx = AnalysisContext::builder(PipelineConfig::default(), rules())
            .build()
            .unwrap();
        assert_eq!(ctx.rules().len(), 1);
        assert!(!ctx.ontology().is_empty());
        assert_eq!(ctx.index.dim(), HashingEmbedder::DEFAULT_DIM);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = PipelineConfig {
            top_k: 0,
            ..Default::default()
        };
        let err = AnalysisContext::builder(config, rules()).build().err().unwrap();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let err = AnalysisContext::builder(PipelineConfig::default(), rules())
            .embedder(Arc::new(HashingEmbedder::new(64)))
            .index(Arc::new(MemoryIndex::new(384)))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, AnalysisError::Context(_)));
    }
}
