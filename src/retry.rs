//! Invocation redelivery with exponential backoff.
//!
//! The unit of retry is a whole fan-out invocation, never a single provider
//! call. Outputs are keyed, so re-running an invocation overwrites records
//! instead of duplicating them.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// How often, and how patiently, a failed invocation is re-run.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total runs allowed, the first one included
    pub max_attempts: u32,
    /// Wait before the first redelivery
    pub initial_delay: Duration,
    /// Upper bound for any single wait
    pub max_delay: Duration,
    /// Growth factor applied to the wait after each redelivery
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    /// In-process redelivery used by the ingress.
    /// Waits 1s, 2s, 4s ... capped at 10s
    pub fn redelivery(max_attempts: u32) -> Self {
        Self {
            max_delay: Duration::from_secs(10),
            ..Self::new(max_attempts.max(1), Duration::from_secs(1))
        }
    }

    /// Wait after the `failed`-th run (1-indexed) before the next one.
    fn delay_after(&self, failed: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(failed.saturating_sub(1) as i32);
        self.initial_delay.mul_f64(factor).min(self.max_delay)
    }
}

impl Default for RetryConfig {
    /// A single attempt: failures are left to the hosting platform's redelivery.
    fn default() -> Self {
        Self::redelivery(1)
    }
}

/// Run `operation`, re-running it while `should_retry` accepts the error and
/// attempts remain.
///
/// # Panics
/// Panics if `config.max_attempts` is 0
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    assert!(
        config.max_attempts >= 1,
        "RetryConfig.max_attempts must be >= 1, got {}",
        config.max_attempts
    );

    let mut attempt = 1;
    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!("{}: succeeded on run {}", operation_name, attempt);
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !should_retry(&err) {
            debug!("{}: permanent failure, not re-running: {}", operation_name, err);
            return Err(err);
        }

        if attempt >= config.max_attempts {
            if config.max_attempts > 1 {
                warn!(
                    "{}: giving up after {} runs: {}",
                    operation_name, config.max_attempts, err
                );
            }
            return Err(err);
        }

        let delay = config.delay_after(attempt);
        warn!(
            "{}: run {}/{} failed ({}), re-running in {:?}",
            operation_name, attempt, config.max_attempts, err, delay
        );
        sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Operation failing with `error` for the first `failures` runs.
    fn failing_then_ok(
        counter: Arc<AtomicU32>,
        failures: u32,
        error: &'static str,
    ) -> impl FnMut() -> std::future::Ready<Result<u32, &'static str>> {
        move || {
            let run = counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if run < failures { Err(error) } else { Ok(42) })
        }
    }

    #[test]
    fn test_default_is_single_attempt() {
        assert_eq!(RetryConfig::default().max_attempts, 1);
    }

    #[test]
    fn test_redelivery_preset() {
        let config = RetryConfig::redelivery(4);
        assert_eq!(config.max_attempts, 4);
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(10));
    }

    #[test]
    fn test_redelivery_clamps_zero() {
        assert_eq!(RetryConfig::redelivery(0).max_attempts, 1);
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let config = RetryConfig::redelivery(10);

        assert_eq!(config.delay_after(1), Duration::from_secs(1));
        assert_eq!(config.delay_after(2), Duration::from_secs(2));
        assert_eq!(config.delay_after(3), Duration::from_secs(4));
        assert_eq!(config.delay_after(4), Duration::from_secs(8));
        assert_eq!(config.delay_after(5), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_first_run_success() {
        let config = RetryConfig::new(3, Duration::from_millis(10));
        let counter = Arc::new(AtomicU32::new(0));

        let result =
            with_retry_if(&config, "test", failing_then_ok(counter.clone(), 0, "x"), |_| true).await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reruns_until_success() {
        let config = RetryConfig::new(3, Duration::from_millis(10));
        let counter = Arc::new(AtomicU32::new(0));

        let result = with_retry_if(
            &config,
            "test",
            failing_then_ok(counter.clone(), 2, "temporary failure"),
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let config = RetryConfig::new(3, Duration::from_millis(10));
        let counter = Arc::new(AtomicU32::new(0));

        let result = with_retry_if(
            &config,
            "test",
            failing_then_ok(counter.clone(), u32::MAX, "upstream 503"),
            |e: &&str| e.contains("503"),
        )
        .await;

        assert_eq!(result.unwrap_err(), "upstream 503");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_rerun() {
        let config = RetryConfig::new(3, Duration::from_millis(10));
        let counter = Arc::new(AtomicU32::new(0));

        let result = with_retry_if(
            &config,
            "test",
            failing_then_ok(counter.clone(), u32::MAX, "rejected 400"),
            |e: &&str| !e.contains("400"),
        )
        .await;

        assert_eq!(result.unwrap_err(), "rejected 400");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_does_not_wait() {
        let config = RetryConfig::default();
        let start = std::time::Instant::now();

        let result: Result<u32, &str> =
            with_retry_if(&config, "test", || async { Err("fail") }, |_| true).await;

        assert!(result.is_err());
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    #[should_panic(expected = "max_attempts must be >= 1")]
    async fn test_panics_on_zero_attempts() {
        let config = RetryConfig::new(0, Duration::from_millis(10));
        let _: Result<u32, &str> =
            with_retry_if(&config, "test", || async { Ok(1) }, |_| true).await;
    }
}
