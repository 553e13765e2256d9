//! ONNX Runtime models: a mean-pooled sentence embedder and an NLI-based
//! zero-shot classifier.
//!
//! Each model directory must contain `model.onnx` and `tokenizer.json`.
//! Sessions are wrapped in a mutex so the models can sit behind `&self`
//! trait objects shared across analyses.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Mutex;

use ort::session::{Session, SessionInputValue};
use ort::value::Tensor;
use tokenizers::{EncodeInput, Encoding, Tokenizer};
use tracing::info;

use crate::classifier::{NoiseClassifier, rank_labels};
use crate::embedder::{TextEmbedder, normalize};

/// Sentence embedder for sentence-transformers exports (bge-small, MiniLM).
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    has_token_types: bool,
    dim: usize,
}

impl OnnxEmbedder {
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let (session, tokenizer) = load_model(model_dir, 256)?;
        let dim = infer_dim(session.outputs()[0].dtype()).unwrap_or(384);
        let has_token_types = declares_input(&session, "token_type_ids");

        info!(dim, model = %model_dir.display(), "loaded embedding model");
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            has_token_types,
            dim,
        })
    }
}

impl TextEmbedder for OnnxEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let batch_size = texts.len();
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;
        let batch = InputBatch::from_encodings(&encodings);

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("embedding session lock poisoned"))?;
        let outputs = session.run(batch.inputs(self.has_token_types)?)?;

        // Token embeddings: [batch_size, seq_len, dim].
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 3 && dims[0] as usize == batch_size && dims[2] as usize == self.dim,
            "unexpected output shape: {dims:?}, expected [{batch_size}, {}, {}]",
            batch.seq_len,
            self.dim
        );
        let actual_seq_len = dims[1] as usize;

        let mut embeddings = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let mut pooled = vec![0.0f32; self.dim];
            let mut token_count = 0.0f32;
            for j in 0..actual_seq_len {
                let mask = batch.attention_mask[i * batch.seq_len + j] as f32;
                if mask > 0.0 {
                    let offset = (i * actual_seq_len + j) * self.dim;
                    for (d, p) in pooled.iter_mut().enumerate() {
                        *p += output_data[offset + d] * mask;
                    }
                    token_count += mask;
                }
            }
            if token_count > 0.0 {
                for p in &mut pooled {
                    *p /= token_count;
                }
            }
            normalize(&mut pooled);
            embeddings.push(pooled);
        }
        Ok(embeddings)
    }
}

/// Zero-shot classifier over an MNLI cross-encoder (e.g. `bart-large-mnli`).
///
/// Each label becomes the hypothesis `"This example is {label}."`; the
/// entailment logits across labels are softmaxed into scores.
pub struct ZeroShotClassifier {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    has_token_types: bool,
    entailment_index: usize,
}

impl ZeroShotClassifier {
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let (session, tokenizer) = load_model(model_dir, 512)?;
        let has_token_types = declares_input(&session, "token_type_ids");
        let entailment_index = entailment_index(model_dir).unwrap_or(2);

        info!(
            entailment_index,
            model = %model_dir.display(),
            "loaded zero-shot classifier"
        );
        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            has_token_types,
            entailment_index,
        })
    }
}

impl NoiseClassifier for ZeroShotClassifier {
    fn classify(&self, text: &str, labels: &[&str]) -> anyhow::Result<Vec<(String, f32)>> {
        if labels.is_empty() {
            return Ok(vec![]);
        }
        let pairs: Vec<EncodeInput> = labels
            .iter()
            .map(|label| (text.to_string(), format!("This example is {label}.")).into())
            .collect();
        let encodings = self
            .tokenizer
            .encode_batch(pairs, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;
        let batch = InputBatch::from_encodings(&encodings);

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("classifier session lock poisoned"))?;
        let outputs = session.run(batch.inputs(self.has_token_types)?)?;

        // Logits: [labels, classes].
        let (shape, logits) = outputs[0].try_extract_tensor::<f32>()?;
        anyhow::ensure!(
            shape.len() == 2
                && shape[0] as usize == labels.len()
                && (shape[1] as usize) > self.entailment_index,
            "unexpected logits shape: {shape:?}"
        );
        let classes = shape[1] as usize;
        let entailment: Vec<f32> = (0..labels.len())
            .map(|i| logits[i * classes + self.entailment_index])
            .collect();
        Ok(rank_labels(labels, &entailment))
    }
}

/// Padded `[batch, seq_len]` input tensors.
struct InputBatch {
    seq_len: usize,
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
}

impl InputBatch {
    fn from_encodings(encodings: &[Encoding]) -> Self {
        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);
        let n = encodings.len() * seq_len;
        let mut batch = Self {
            seq_len,
            input_ids: vec![0; n],
            attention_mask: vec![0; n],
            token_type_ids: vec![0; n],
        };
        for (i, encoding) in encodings.iter().enumerate() {
            let offset = i * seq_len;
            for (j, &id) in encoding.get_ids().iter().enumerate() {
                batch.input_ids[offset + j] = id as i64;
            }
            for (j, &mask) in encoding.get_attention_mask().iter().enumerate() {
                batch.attention_mask[offset + j] = mask as i64;
            }
            for (j, &tid) in encoding.get_type_ids().iter().enumerate() {
                batch.token_type_ids[offset + j] = tid as i64;
            }
        }
        batch
    }

    fn inputs(
        &self,
        with_token_types: bool,
    ) -> anyhow::Result<Vec<(Cow<'static, str>, SessionInputValue<'static>)>> {
        let rows = if self.seq_len == 0 {
            0
        } else {
            self.input_ids.len() / self.seq_len
        };
        let shape = [rows as i64, self.seq_len as i64];

        let ids = Tensor::from_array((shape, self.input_ids.clone().into_boxed_slice()))?;
        let mask = Tensor::from_array((shape, self.attention_mask.clone().into_boxed_slice()))?;
        let mut inputs = ort::inputs![
            "input_ids" => ids,
            "attention_mask" => mask,
        ];
        if with_token_types {
            let types =
                Tensor::from_array((shape, self.token_type_ids.clone().into_boxed_slice()))?;
            inputs.push(("token_type_ids".into(), types.into()));
        }
        Ok(inputs)
    }
}

fn load_model(model_dir: &Path, max_length: usize) -> anyhow::Result<(Session, Tokenizer)> {
    let model_path = model_dir.join("model.onnx");
    let tokenizer_path = model_dir.join("tokenizer.json");

    anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
    anyhow::ensure!(
        tokenizer_path.exists(),
        "tokenizer.json not found in {model_dir:?}"
    );

    let session = Session::builder()?.commit_from_file(&model_path)?;

    let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
        .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
    tokenizer
        .with_truncation(Some(tokenizers::TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
    tokenizer.with_padding(Some(tokenizers::PaddingParams::default()));

    Ok((session, tokenizer))
}

fn declares_input(session: &Session, name: &str) -> bool {
    session.inputs().iter().any(|input| input.name() == name)
}

/// Last dimension of the first output, when static.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}

/// Position of the "entailment" class in `config.json`'s `label2id`.
fn entailment_index(model_dir: &Path) -> Option<usize> {
    let raw = std::fs::read_to_string(model_dir.join("config.json")).ok()?;
    let config: serde_json::Value = serde_json::from_str(&raw).ok()?;
    config
        .get("label2id")?
        .as_object()?
        .iter()
        .find(|(label, _)| label.eq_ignore_ascii_case("entailment"))
        .and_then(|(_, id)| id.as_u64())
        .map(|id| id as usize)
}
