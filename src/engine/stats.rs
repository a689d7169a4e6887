//! Per-run counters reported alongside the store.

use crate::model::RunId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// What happened during one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
    /// Identifiers in the initial working set.
    pub seeded: u64,
    /// Attempts registered, initial and retries.
    pub spawned: u64,
    /// Outcomes fully consumed.
    pub released: u64,
    pub committed: u64,
    pub retried: u64,
    /// Dropped after the retry limit was used up.
    pub exhausted: u64,
    /// Dropped because the payload did not decode.
    pub undecodable: u64,
    #[serde(rename = "max_latency_ms", serialize_with = "as_millis")]
    pub max_latency: Duration,
    #[serde(rename = "total_latency_ms", serialize_with = "as_millis")]
    pub total_latency: Duration,
}

impl RunStats {
    pub fn record_latency(&mut self, latency: Duration) {
        self.total_latency += latency;
        self.max_latency = self.max_latency.max(latency);
    }

    /// Mean latency over successful fetches, including undecodable ones.
    pub fn mean_latency(&self) -> Option<Duration> {
        let fetched = self.committed + self.undecodable;
        (fetched > 0).then(|| self.total_latency.div_f64(fetched as f64))
    }
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}
