//! Dispatch, retry and aggregation engine.
//!
//! `Engine::run` seeds one attempt per identifier, lets the worker pool fetch
//! them, and blocks on the aggregator until the in-flight count reaches zero.

pub mod aggregate;
pub mod channel;
pub mod dispatch;
pub mod inflight;
pub mod stats;
pub mod worker;

pub use aggregate::Aggregator;
pub use dispatch::{Dispatcher, WorkerPool};
pub use inflight::{InFlight, InFlightSnapshot, WorkToken};
pub use stats::RunStats;

use crate::decode::Decoder;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::model::{ItemId, ResultStore, RunId};
use crate::telemetry::metrics::EngineMetrics;
use crate::telemetry::run::{record_run_totals, start_run_span};
use channel::outcome_channels;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Instrument, info};

/// Tuning for one engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Retries allowed after the first failure. Each id gets at most
    /// `retry_limit + 1` attempts.
    pub retry_limit: u32,
    /// Deadline for a single attempt.
    pub attempt_timeout: Duration,
    /// Maximum attempts running at once.
    pub concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry_limit: 3,
            attempt_timeout: Duration::from_secs(1),
            concurrency: 64,
        }
    }
}

/// Final store plus the run's counters.
#[derive(Debug)]
pub struct RunOutput<V> {
    pub store: ResultStore<V>,
    pub stats: RunStats,
}

/// The engine. Cheap to run repeatedly; each run gets fresh queues and counters.
pub struct Engine<F, D> {
    fetcher: Arc<F>,
    decoder: Arc<D>,
    config: EngineConfig,
}

impl<F: Fetcher, D: Decoder> Engine<F, D> {
    pub fn new(fetcher: F, decoder: D, config: EngineConfig) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            decoder: Arc::new(decoder),
            config,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch every id, retrying failures, and return once nothing is in flight.
    ///
    /// Partial loss is not an error: ids that never succeed are simply absent
    /// from the store.
    pub async fn run(
        &self,
        ids: impl IntoIterator<Item = ItemId>,
    ) -> Result<RunOutput<D::Value>> {
        let run_id = RunId::new();
        let started_at = Utc::now();
        let start = Instant::now();
        let span = start_run_span(&run_id);

        async {
            let metrics = EngineMetrics::new();
            let inflight = InFlight::new();
            let (outcome_tx, outcome_rx) = outcome_channels();
            let (dispatcher, jobs) = Dispatcher::new(inflight.clone());

            // Everything is registered before the aggregator can observe zero.
            let seeded = dispatcher.seed(ids)?;
            info!(
                seeded,
                retry_limit = self.config.retry_limit,
                concurrency = self.config.concurrency,
                "dispatch seeded"
            );

            let pool = WorkerPool::new(
                Arc::clone(&self.fetcher),
                outcome_tx,
                self.config.concurrency,
                self.config.attempt_timeout,
                metrics.clone(),
            );
            let pool = tokio::spawn(pool.run(jobs).in_current_span());

            let aggregator = Aggregator::new(
                Arc::clone(&self.decoder),
                dispatcher,
                inflight.clone(),
                self.config.retry_limit,
                metrics,
            );
            let (store, mut stats) = aggregator.run(outcome_rx).await;
            pool.await?;

            let counts = inflight.snapshot();
            stats.run_id = run_id;
            stats.started_at = started_at;
            stats.elapsed = start.elapsed();
            stats.seeded = seeded as u64;
            stats.spawned = counts.spawned;
            stats.released = counts.released;

            record_run_totals(&tracing::Span::current(), stats.seeded, stats.committed);
            info!(
                stored = store.len(),
                spawned = stats.spawned,
                retried = stats.retried,
                exhausted = stats.exhausted,
                undecodable = stats.undecodable,
                mean_latency_ms = stats.mean_latency().map(|d| d.as_millis() as u64),
                elapsed_ms = stats.elapsed.as_millis() as u64,
                "run complete"
            );

            Ok::<_, crate::error::Error>(RunOutput { store, stats })
        }
        .instrument(span)
        .await
    }
}
