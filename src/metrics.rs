//! Request counters for the health endpoint.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Process-wide translation counters.
#[derive(Debug, Default)]
pub struct ServiceMetrics {
    /// Requests accepted by the pipeline (including ones still waiting on the gate)
    requests: AtomicUsize,

    /// Requests that produced a translation
    successes: AtomicUsize,

    /// Requests that failed after admission
    failures: AtomicUsize,

    /// Calls dispatched to the engine
    engine_calls: AtomicUsize,
}

static METRICS: OnceLock<ServiceMetrics> = OnceLock::new();

impl ServiceMetrics {
    /// The process-wide instance.
    pub fn global() -> &'static ServiceMetrics {
        METRICS.get_or_init(ServiceMetrics::default)
    }

    /// Count a request accepted by the pipeline.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a request that produced a translation.
    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a request that failed after admission.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a call dispatched to the engine.
    pub fn record_engine_call(&self) {
        self.engine_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of the current counters.
    pub fn report(&self) -> MetricsReport {
        let successes = self.successes.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);
        let finished = successes + failures;
        let success_rate = if finished > 0 {
            (successes as f64 / finished as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            requests: self.requests.load(Ordering::Relaxed),
            successes,
            failures,
            success_rate,
            engine_calls: self.engine_calls.load(Ordering::Relaxed),
        }
    }
}

/// Serializable counter snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub requests: usize,
    pub successes: usize,
    pub failures: usize,
    /// Percentage of finished requests that succeeded (0-100)
    pub success_rate: f64,
    pub engine_calls: usize,
}
