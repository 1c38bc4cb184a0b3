//! Translation metrics and observability module.
//!
//! Tracks fan-out invocations, translation API calls, pass-through copies and
//! output writes. Counters are process-wide and only ever increase.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Translation fan-out counters.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Number of fan-out invocations started
    invocations: AtomicUsize,

    /// Number of fan-out invocations that reported failure
    failed_invocations: AtomicUsize,

    /// Number of API calls made to the translation provider
    api_calls: AtomicUsize,

    /// Number of translation API calls that failed
    api_failures: AtomicUsize,

    /// Number of verbatim copies written for the source language
    pass_through_copies: AtomicUsize,

    /// Number of output writes attempted
    writes: AtomicUsize,

    /// Number of output writes that failed
    write_failures: AtomicUsize,
}

/// Global metrics instance (initialized lazily)
static METRICS: OnceLock<TranslationMetrics> = OnceLock::new();

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the global translation metrics instance.
    pub fn global() -> &'static TranslationMetrics {
        METRICS.get_or_init(TranslationMetrics::new)
    }

    pub fn record_invocation(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed_invocation(&self) {
        self.failed_invocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an API call to the translation service.
    pub fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an API call failure.
    pub fn record_api_failure(&self) {
        self.api_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pass_through(&self) {
        self.pass_through_copies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::Relaxed)
    }

    pub fn failed_invocations(&self) -> usize {
        self.failed_invocations.load(Ordering::Relaxed)
    }

    /// Get the current API call count.
    pub fn api_calls(&self) -> usize {
        self.api_calls.load(Ordering::Relaxed)
    }

    /// Get the current API failure count.
    pub fn api_failures(&self) -> usize {
        self.api_failures.load(Ordering::Relaxed)
    }

    pub fn pass_through_copies(&self) -> usize {
        self.pass_through_copies.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn write_failures(&self) -> usize {
        self.write_failures.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let calls = self.api_calls();
        let failures = self.api_failures();

        MetricsReport {
            invocations: self.invocations(),
            failed_invocations: self.failed_invocations(),
            api_calls: calls,
            api_failures: failures,
            api_success_rate: success_rate(calls, failures),
            pass_through_copies: self.pass_through_copies(),
            writes: self.writes(),
            write_failures: self.write_failures(),
        }
    }
}

fn success_rate(total: usize, failures: usize) -> f64 {
    if total > 0 {
        (total.saturating_sub(failures) as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Metrics report containing current translation statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub invocations: usize,
    pub failed_invocations: usize,

    /// Number of API calls made
    pub api_calls: usize,

    /// Number of API failures
    pub api_failures: usize,

    /// API success rate as a percentage (0-100)
    pub api_success_rate: f64,

    pub pass_through_copies: usize,
    pub writes: usize,
    pub write_failures: usize,
}
