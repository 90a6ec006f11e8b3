//! Retry-with-backoff shared by the three model capability contracts
//! (§4.A).
//!
//! Non-retryable errors short-circuit immediately; retryable ones back off
//! exponentially with jitter, bounded by both an attempt count and a total
//! wall-clock deadline (§4.A, §5).

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::error::PipelineError;

/// The outcome classification a provider call must report so the retry
/// loop knows whether to try again.
#[derive(Debug, Clone)]
pub enum ModelCallError {
    /// Rate-limited or a transient network/timeout failure — retry.
    Transient(String),
    /// Anything else — authentication, malformed request, content
    /// rejection. Not retryable.
    Fatal(String),
}

impl std::fmt::Display for ModelCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelCallError::Transient(msg) => write!(f, "transient: {msg}"),
            ModelCallError::Fatal(msg) => write!(f, "fatal: {msg}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub per_attempt_timeout: Duration,
    pub total_deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::config::MIN_RETRY_ATTEMPTS,
            base_delay: Duration::from_secs(1),
            per_attempt_timeout: crate::config::MODEL_CALL_TIMEOUT,
            total_deadline: Duration::from_secs(300),
        }
    }
}

/// Deterministic jitter spread from the attempt index and a call id, so
/// retries of the same logical call don't all wake up at the same instant,
/// without reaching for the `rand` crate.
fn jitter_fraction(call_id: &str, attempt: u32) -> f64 {
    let mut acc: u64 = attempt as u64 * 2654435761;
    for byte in call_id.bytes() {
        acc = acc.wrapping_mul(31).wrapping_add(byte as u64);
    }
    // Map into [-0.2, 0.2].
    ((acc % 1000) as f64 / 1000.0) * 0.4 - 0.2
}

/// Run `operation` with exponential backoff: `base_delay * 2^attempt`,
/// jittered by ±20%, up to `policy.max_attempts` tries or until
/// `policy.total_deadline` elapses, whichever comes first.
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    call_id: &str,
    mut operation: F,
) -> Result<T, PipelineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ModelCallError>>,
{
    let start = Instant::now();
    let mut last_error = None;

    for attempt in 0..policy.max_attempts {
        if start.elapsed() >= policy.total_deadline {
            break;
        }

        match timeout(policy.per_attempt_timeout, operation()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(ModelCallError::Fatal(msg))) => {
                return Err(PipelineError::ModelFatal(msg));
            }
            Ok(Err(ModelCallError::Transient(msg))) => last_error = Some(msg),
            Err(_) => last_error = Some(format!("timed out after {:?}", policy.per_attempt_timeout)),
        }

        if attempt + 1 < policy.max_attempts {
            let backoff = policy.base_delay.mul_f64(2f64.powi(attempt as i32));
            let jitter = jitter_fraction(call_id, attempt);
            let wait = backoff.mul_f64(1.0 + jitter);
            tokio::time::sleep(wait).await;
        }
    }

    Err(PipelineError::ModelTransient(last_error.unwrap_or_else(|| {
        format!("operation failed after {} attempts", policy.max_attempts)
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            per_attempt_timeout: Duration::from_secs(1),
            total_deadline: Duration::from_secs(5),
        };
        let result = retry_with_backoff(&policy, "call-1", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ModelCallError::Transient("rate limited".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_error_short_circuits() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            per_attempt_timeout: Duration::from_secs(1),
            total_deadline: Duration::from_secs(5),
        };
        let result: Result<(), _> = retry_with_backoff(&policy, "call-2", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(ModelCallError::Fatal("bad request".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
