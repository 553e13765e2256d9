//! LLM adjudication of candidate matches.
//!
//! One prompt per analysis enumerates every candidate; the response is
//! recovered, validated against the request, and typed into verdicts.
//! Transport, timeout and parse failures share one retry budget and surface
//! as a typed [`AdjudicationError`] once it is spent.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use termsguard_core::{CandidateMatch, Verdict};
use thiserror::Error;
use tracing::{info, warn};

use crate::ollama::{GenerateError, Generator, OllamaClient};
use crate::prompt::build_prompt;
use crate::recovery::{RecoveryStage, recover, validate};
use crate::retry::{AttemptFailure, Exhausted, RetryPolicy};

/// Raw responses kept on parse errors are cut to this many chars.
const RAW_EXCERPT_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjudicatorConfig {
    /// Base URL of the Ollama server.
    pub url: String,
    pub model: String,
    pub temperature: f32,
    /// Generation token cap.
    pub num_predict: u32,
    /// Per-attempt timeout.
    pub timeout_secs: u64,
    /// Retries after the first attempt.
    pub max_retries: usize,
    pub backoff_ms: u64,
}

impl Default for AdjudicatorConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".into(),
            model: "mistral:latest".into(),
            temperature: 0.1,
            num_predict: 2048,
            timeout_secs: 150,
            max_retries: 1,
            backoff_ms: 0,
        }
    }
}

impl AdjudicatorConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            timeout: Duration::from_secs(self.timeout_secs),
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}

#[derive(Debug, Error)]
pub enum AdjudicationError {
    #[error("adjudicator unreachable after {attempts} attempt(s): {message}")]
    Transport { attempts: usize, message: String },

    #[error("adjudicator timed out after {attempts} attempt(s) of {timeout_secs}s")]
    Timeout { attempts: usize, timeout_secs: u64 },

    #[error("adjudicator returned HTTP {status} after {attempts} attempt(s): {body}")]
    Status {
        attempts: usize,
        status: u16,
        body: String,
    },

    #[error("unusable adjudicator response after {attempts} attempt(s): {message}")]
    Parse {
        attempts: usize,
        message: String,
        /// The last raw response, truncated.
        raw: String,
    },
}

impl AdjudicationError {
    pub fn attempts(&self) -> usize {
        match self {
            Self::Transport { attempts, .. }
            | Self::Timeout { attempts, .. }
            | Self::Status { attempts, .. }
            | Self::Parse { attempts, .. } => *attempts,
        }
    }
}

/// Verdicts for every candidate, in candidate order.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjudication {
    pub verdicts: Vec<Verdict>,
    pub summary: String,
    pub stage: Option<RecoveryStage>,
}

/// A failed single attempt.
#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error("{message}")]
    Parse { message: String, raw: String },
}

pub struct Adjudicator {
    generator: Arc<dyn Generator>,
    retry: RetryPolicy,
}

impl Adjudicator {
    pub fn new(generator: Arc<dyn Generator>, retry: RetryPolicy) -> Self {
        Self { generator, retry }
    }

    /// Adjudicator talking to the Ollama server in `config`.
    pub fn from_config(config: &AdjudicatorConfig) -> Self {
        Self::new(Arc::new(OllamaClient::new(config)), config.retry_policy())
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub async fn adjudicate(
        &self,
        candidates: &[CandidateMatch],
    ) -> Result<Adjudication, AdjudicationError> {
        if candidates.is_empty() {
            return Ok(Adjudication {
                verdicts: Vec::new(),
                summary: "No candidate matches to review.".into(),
                stage: None,
            });
        }

        let prompt = build_prompt(candidates);
        let prompt = prompt.as_str();
        let generator = self.generator.as_ref();

        let result = self
            .retry
            .run(|attempt| async move {
                let raw = generator.generate(prompt).await?;
                let (stage, response) = recover(&raw).ok_or_else(|| AttemptError::Parse {
                    message: "no JSON object recoverable from response".into(),
                    raw: excerpt(&raw),
                })?;
                let (verdicts, summary) =
                    validate(response, candidates).map_err(|message| AttemptError::Parse {
                        message,
                        raw: excerpt(&raw),
                    })?;
                info!(
                    attempt,
                    candidates = candidates.len(),
                    stage = ?stage,
                    "adjudication parsed"
                );
                Ok::<_, AttemptError>(Adjudication {
                    verdicts,
                    summary,
                    stage: Some(stage),
                })
            })
            .await;

        result.map_err(|exhausted| {
            let err = self.classify(exhausted);
            warn!(error = %err, "adjudication failed");
            err
        })
    }

    fn classify(&self, exhausted: Exhausted<AttemptError>) -> AdjudicationError {
        let attempts = exhausted.attempts;
        match exhausted.last {
            AttemptFailure::TimedOut => AdjudicationError::Timeout {
                attempts,
                timeout_secs: self.retry.timeout.as_secs(),
            },
            AttemptFailure::Failed(AttemptError::Generate(GenerateError::Transport(message))) => {
                AdjudicationError::Transport { attempts, message }
            }
            AttemptFailure::Failed(AttemptError::Generate(GenerateError::Status {
                status,
                body,
            })) => AdjudicationError::Status {
                attempts,
                status,
                body,
            },
            AttemptFailure::Failed(AttemptError::Parse { message, raw }) => {
                AdjudicationError::Parse {
                    attempts,
                    message,
                    raw,
                }
            }
        }
    }
}

fn excerpt(raw: &str) -> String {
    raw.chars().take(RAW_EXCERPT_CHARS).collect()
}
