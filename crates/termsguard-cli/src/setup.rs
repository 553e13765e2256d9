//! Assembles an [`AnalysisContext`] from command-line settings.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use termsguard_ai::{Adjudicator, AdjudicatorConfig, HashingEmbedder, NoiseClassifier, TextEmbedder};
use termsguard_core::PipelineConfig;
use termsguard_engine::{AnalysisContext, ContextBuilder};
use termsguard_store::RuleSet;
use tracing::info;

use crate::ModelArgs;

pub async fn build_context(
    models: &ModelArgs,
    adjudicator: &AdjudicatorConfig,
    config: PipelineConfig,
) -> anyhow::Result<AnalysisContext> {
    let rules = RuleSet::load(&models.rules)
        .with_context(|| format!("loading rules from {}", models.rules.display()))?;
    info!(rules = rules.len(), path = %models.rules.display(), "rule corpus loaded");

    let mut builder = AnalysisContext::builder(config, Arc::new(rules))
        .embedder(load_embedder(models.model_dir.as_deref())?)
        .adjudicator(Adjudicator::from_config(adjudicator));
    if let Some(noise) = load_noise_classifier(models.classifier_dir.as_deref())? {
        builder = builder.noise_classifier(noise);
    }
    let builder = attach_index(builder, models.index.as_deref()).await?;

    builder.build().context("building analysis context")
}

/// The ONNX embedder when a model directory is given, else the hashing embedder.
pub fn load_embedder(model_dir: Option<&Path>) -> anyhow::Result<Arc<dyn TextEmbedder>> {
    match model_dir {
        #[cfg(feature = "onnx")]
        Some(dir) => {
            let embedder = termsguard_ai::OnnxEmbedder::load(dir)
                .with_context(|| format!("loading embedding model from {}", dir.display()))?;
            Ok(Arc::new(embedder))
        }
        #[cfg(not(feature = "onnx"))]
        Some(dir) => {
            tracing::warn!(
                model_dir = %dir.display(),
                "built without the onnx feature, using the hashing embedder"
            );
            Ok(Arc::new(HashingEmbedder::default()))
        }
        None => Ok(Arc::new(HashingEmbedder::default())),
    }
}

fn load_noise_classifier(
    model_dir: Option<&Path>,
) -> anyhow::Result<Option<Arc<dyn NoiseClassifier>>> {
    match model_dir {
        #[cfg(feature = "onnx")]
        Some(dir) => {
            let classifier: Arc<dyn NoiseClassifier> = Arc::new(
                termsguard_ai::ZeroShotClassifier::load(dir)
                    .with_context(|| format!("loading zero-shot model from {}", dir.display()))?,
            );
            Ok(Some(classifier))
        }
        #[cfg(not(feature = "onnx"))]
        Some(dir) => {
            tracing::warn!(
                model_dir = %dir.display(),
                "built without the onnx feature, noise gate disabled"
            );
            Ok(None)
        }
        None => Ok(None),
    }
}

async fn attach_index(
    builder: ContextBuilder,
    path: Option<&Path>,
) -> anyhow::Result<ContextBuilder> {
    match path {
        #[cfg(feature = "lancedb")]
        Some(path) => {
            let index = termsguard_store::LanceRuleIndex::open(path)
                .await
                .with_context(|| format!("opening rule index at {}", path.display()))?;
            Ok(builder.index(Arc::new(index)))
        }
        #[cfg(not(feature = "lancedb"))]
        Some(path) => {
            tracing::warn!(
                index = %path.display(),
                "built without the lancedb feature, using the in-memory index"
            );
            Ok(builder)
        }
        None => Ok(builder),
    }
}
