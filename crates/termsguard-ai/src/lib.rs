//! Model-backed collaborators: sentence embeddings, zero-shot noise
//! classification, and LLM adjudication of candidate matches.

pub mod adjudicator;
pub mod classifier;
pub mod embedder;
pub mod ollama;
pub mod prompt;
pub mod recovery;
pub mod retry;

pub use adjudicator::{Adjudication, AdjudicationError, Adjudicator, AdjudicatorConfig};
pub use classifier::{NOISE_LABELS, NoiseClassifier};
pub use embedder::{HashingEmbedder, TextEmbedder};
pub use ollama::{GenerateError, Generator, OllamaClient};
pub use recovery::RecoveryStage;
pub use retry::RetryPolicy;

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use onnx::{OnnxEmbedder, ZeroShotClassifier};
