//! Bounded retry with a per-attempt timeout.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// `max_retries` extra attempts after the first, each bounded by `timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub timeout: Duration,
    /// Sleep before retry `n` is `backoff * n`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            timeout: Duration::from_secs(150),
            backoff: Duration::ZERO,
        }
    }
}

/// Why a single attempt failed.
#[derive(Debug, PartialEq)]
pub enum AttemptFailure<E> {
    Failed(E),
    TimedOut,
}

/// Every attempt failed; carries the last failure.
#[derive(Debug, PartialEq)]
pub struct Exhausted<E> {
    pub attempts: usize,
    pub last: AttemptFailure<E>,
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> usize {
        self.max_retries + 1
    }

    /// Run `op` until it succeeds or the budget is spent. `op` receives the
    /// 1-based attempt number and must be safe to repeat.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, Exhausted<E>>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let failure = match tokio::time::timeout(self.timeout, op(attempt)).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => AttemptFailure::Failed(e),
                Err(_) => AttemptFailure::TimedOut,
            };
            if attempt >= self.max_attempts() {
                return Err(Exhausted {
                    attempts: attempt,
                    last: failure,
                });
            }
            match &failure {
                AttemptFailure::Failed(e) => {
                    warn!(attempt, max_attempts = self.max_attempts(), error = %e, "attempt failed, retrying")
                }
                AttemptFailure::TimedOut => warn!(
                    attempt,
                    max_attempts = self.max_attempts(),
                    timeout_secs = self.timeout.as_secs_f64(),
                    "attempt timed out, retrying"
                ),
            }
            if !self.backoff.is_zero() {
                tokio::time::sleep(self.backoff.saturating_mul(attempt as u32)).await;
            }
        }
    }
}
