//! Metric instrument factories for photofetch.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without a provider every instrument is a no-op.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for photofetch instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("photofetch")
}

/// Counter: fetch attempts finished.
/// Labels: `result` ("success" | "failure").
pub fn fetch_attempts() -> Counter<u64> {
    meter()
        .u64_counter("photofetch.fetch.attempts")
        .with_description("Number of fetch attempts completed")
        .build()
}

/// Counter: retries scheduled after a failed attempt.
pub fn fetch_retries() -> Counter<u64> {
    meter()
        .u64_counter("photofetch.fetch.retries")
        .with_description("Number of retries scheduled")
        .build()
}

/// Counter: results committed to the store.
pub fn items_committed() -> Counter<u64> {
    meter()
        .u64_counter("photofetch.items.committed")
        .with_description("Number of parsed results stored")
        .build()
}

/// Counter: identifiers permanently dropped.
/// Labels: `reason` ("exhausted" | "undecodable").
pub fn items_dropped() -> Counter<u64> {
    meter()
        .u64_counter("photofetch.items.dropped")
        .with_description("Number of identifiers given up on")
        .build()
}

/// Histogram: latency of successful fetches in milliseconds.
pub fn fetch_latency_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("photofetch.fetch.latency_ms")
        .with_description("Successful fetch latency in milliseconds")
        .with_unit("ms")
        .build()
}

/// Instruments built once per run and cloned into workers.
#[derive(Clone)]
pub struct EngineMetrics {
    pub attempts: Counter<u64>,
    pub retries: Counter<u64>,
    pub committed: Counter<u64>,
    pub dropped: Counter<u64>,
    pub fetch_latency_ms: Histogram<f64>,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            attempts: fetch_attempts(),
            retries: fetch_retries(),
            committed: items_committed(),
            dropped: items_dropped(),
            fetch_latency_ms: fetch_latency_ms(),
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
