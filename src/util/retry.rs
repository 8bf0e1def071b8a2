//! Retry with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use crate::error::ThreadlineError;

/// Retry policy for opening model streams.
///
/// Only the connection attempt is retried. Once a stream has produced a
/// delta, a failure is final for the turn.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Execute an async operation, retrying retryable errors.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, ThreadlineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ThreadlineError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !err.is_retryable() || attempt >= attempts {
                return Err(err);
            }

            let delay = match &err {
                ThreadlineError::RateLimited {
                    retry_after_ms: Some(ms),
                } => Duration::from_millis(*ms).min(self.max_backoff),
                _ => backoff.mul_f64(0.75 + jitter() * 0.5),
            };
            tracing::warn!(
                attempt,
                max_attempts = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying model request"
            );
            tokio::time::sleep(delay).await;
            backoff = backoff.mul_f64(self.multiplier).min(self.max_backoff);
        }
    }
}

/// Uniform factor in [0, 1) taken from random uuid bits.
fn jitter() -> f64 {
    let bits = uuid::Uuid::new_v4().as_u128() as u64;
    (bits % 10_000) as f64 / 10_000.0
}
