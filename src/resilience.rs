//! Retry with jittered backoff and a consecutive-failure circuit breaker for
//! outbound calls.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::Rng;
use serde::Deserialize;
use tracing::warn;

/// Errors that may succeed when retried.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_backoff_ms: 200,
        }
    }
}

/// Run `action`, retrying transient failures with exponential backoff plus
/// up to 25% jitter.
pub async fn with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    label: &str,
    mut action: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match action().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                let base_backoff = policy.initial_backoff_ms * 2u64.pow(attempt);
                let jitter = rand::rng().random_range(0..base_backoff / 4 + 1);
                let backoff = Duration::from_millis(base_backoff + jitter);

                attempt += 1;
                warn!(
                    "{} failed (attempt {}/{}): {}, retrying in {:?}",
                    label,
                    attempt,
                    policy.max_retries + 1,
                    e,
                    backoff
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before the breaker opens
    pub failure_threshold: u32,
    pub cooldown_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown_ms: 30_000,
        }
    }
}

/// Shared across requests so a burst stops hammering a dependency that is
/// known to be down. After the cooldown one call is let through (half-open);
/// its outcome closes or re-opens the breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: &'static str,
    threshold: u32,
    cooldown: Duration,
    failures: AtomicU32,
    opened_at: Mutex<Option<Instant>>,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, config: &BreakerConfig) -> Self {
        Self {
            name,
            threshold: config.failure_threshold.max(1),
            cooldown: Duration::from_millis(config.cooldown_ms),
            failures: AtomicU32::new(0),
            opened_at: Mutex::new(None),
        }
    }

    /// Whether a call may be attempted now.
    pub fn allow(&self) -> bool {
        let mut opened_at = self.opened_at.lock().unwrap_or_else(|e| e.into_inner());
        match *opened_at {
            None => true,
            Some(since) if since.elapsed() >= self.cooldown => {
                // Half-open: the next failure re-arms the cooldown
                *opened_at = Some(Instant::now());
                true
            }
            Some(_) => false,
        }
    }

    pub fn record_success(&self) {
        self.failures.store(0, Ordering::Relaxed);
        let mut opened_at = self.opened_at.lock().unwrap_or_else(|e| e.into_inner());
        if opened_at.take().is_some() {
            tracing::info!("{} circuit closed", self.name);
        }
    }

    pub fn record_failure(&self) {
        let failures = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= self.threshold {
            let mut opened_at = self.opened_at.lock().unwrap_or_else(|e| e.into_inner());
            if opened_at.is_none() {
                warn!(
                    "{} circuit opened after {} consecutive failures",
                    self.name, failures
                );
            }
            *opened_at = Some(Instant::now());
        }
    }

    pub fn is_open(&self) -> bool {
        let opened_at = self.opened_at.lock().unwrap_or_else(|e| e.into_inner());
        matches!(*opened_at, Some(since) if since.elapsed() < self.cooldown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug)]
    struct Flaky(bool);

    impl Transient for Flaky {
        fn is_transient(&self) -> bool {
            self.0
        }
    }

    impl std::fmt::Display for Flaky {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "flaky({})", self.0)
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 1,
            initial_backoff_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_retries_transient_once() {
        let calls = AtomicUsize::new(0);
        let result: Result<u32, Flaky> = with_retry(&fast_policy(), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(Flaky(true))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let calls = AtomicUsize::new(0);
        let result: Result<u32, Flaky> = with_retry(&fast_policy(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Flaky(false)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicUsize::new(0);
        let result: Result<u32, Flaky> = with_retry(&fast_policy(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Flaky(true)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_breaker_opens_and_recovers() {
        let breaker = CircuitBreaker::new(
            "registry",
            &BreakerConfig {
                failure_threshold: 2,
                cooldown_ms: 30,
            },
        );

        assert!(breaker.allow());
        breaker.record_failure();
        assert!(breaker.allow());
        breaker.record_failure();
        assert!(breaker.is_open());
        assert!(!breaker.allow());

        std::thread::sleep(Duration::from_millis(40));
        assert!(breaker.allow());
        breaker.record_success();
        assert!(!breaker.is_open());
        assert!(breaker.allow());
    }

    #[test]
    fn test_success_resets_failure_count() {
        let breaker = CircuitBreaker::new(
            "geocoder",
            &BreakerConfig {
                failure_threshold: 2,
                cooldown_ms: 10_000,
            },
        );

        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        assert!(!breaker.is_open());
    }
}
