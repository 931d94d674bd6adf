//! Bounded exponential backoff for the refund compensation path (spec
//! §4.6). Nothing else in the system retries in-process — everything
//! else relies on broker redelivery, which is why this lives as a
//! narrowly-scoped helper rather than a general retry framework.

use std::future::Future;
use std::time::Duration;

/// `maxAttempts = 3, initial delay 100ms, multiplier 2, cap 2s` are the
/// spec defaults; callers may override for tests.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: u32,
    pub cap: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            multiplier: 2,
            cap: Duration::from_secs(2),
        }
    }
}

impl BackoffPolicy {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled = self.initial_delay.saturating_mul(self.multiplier.saturating_pow(attempt));
        scaled.min(self.cap)
    }
}

/// The outcome of a single attempt, classified by the caller so this
/// helper never has to know what a "transient" error looks like for a
/// particular store. Only `Transient` errors are retried; `Permanent`
/// errors return immediately so the caller can route them straight to
/// the `*Failed` event or the DLQ (spec §7).
pub enum Attempt<T, E> {
    Ok(T),
    Transient(E),
    Permanent(E),
}

/// Retries `f` under `policy`, stopping early on a `Permanent` error or
/// once attempts are exhausted. Returns the last error (tagged by
/// whether it was ever classified transient) when retries are
/// exhausted.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: BackoffPolicy, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T, E>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Attempt::Ok(value) => return Ok(value),
            Attempt::Permanent(err) => return Err(err),
            Attempt::Transient(err) => {
                attempt += 1;
                if attempt >= policy.max_attempts {
                    return Err(err);
                }
                tokio::time::sleep(policy.delay_for_attempt(attempt - 1)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            multiplier: 2,
            cap: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn succeeds_without_retry_when_first_attempt_ok() {
        let calls = AtomicU32::new(0);
        let result: Result<&str, &str> = retry_with_backoff(fast_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Attempt::Ok("done") }
        })
        .await;
        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_errors_until_exhausted() {
        let calls = AtomicU32::new(0);
        let result: Result<&str, &str> = retry_with_backoff(fast_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Attempt::Transient("connection lost") }
        })
        .await;
        assert_eq!(result, Err("connection lost"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_immediately_on_permanent_error() {
        let calls = AtomicU32::new(0);
        let result: Result<&str, &str> = retry_with_backoff(fast_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Attempt::Permanent("wallet not found") }
        })
        .await;
        assert_eq!(result, Err("wallet not found"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<&str, &str> = retry_with_backoff(fast_policy(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 1 {
                    Attempt::Transient("serialization failure")
                } else {
                    Attempt::Ok("recovered")
                }
            }
        })
        .await;
        assert_eq!(result, Ok("recovered"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
