//! Retry coordinator and aggregator.
//!
//! The only code path that touches the result store. Outcomes are handled one
//! at a time, so the store never sees two writers.

use super::channel::{Delivery, OutcomeReceivers};
use super::dispatch::Dispatcher;
use super::inflight::InFlight;
use super::stats::RunStats;
use crate::decode::Decoder;
use crate::model::{Failure, ResultStore, Success};
use crate::telemetry::metrics::EngineMetrics;
use opentelemetry::KeyValue;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Aggregator<D: Decoder> {
    decoder: Arc<D>,
    dispatcher: Dispatcher,
    inflight: InFlight,
    retry_limit: u32,
    store: ResultStore<D::Value>,
    stats: RunStats,
    metrics: EngineMetrics,
}

impl<D: Decoder> Aggregator<D> {
    pub fn new(
        decoder: Arc<D>,
        dispatcher: Dispatcher,
        inflight: InFlight,
        retry_limit: u32,
        metrics: EngineMetrics,
    ) -> Self {
        Self {
            decoder,
            dispatcher,
            inflight,
            retry_limit,
            store: ResultStore::new(),
            stats: RunStats::default(),
            metrics,
        }
    }

    /// Consume outcomes until the in-flight count reaches zero, then hand
    /// back the store.
    ///
    /// Dropping `self` on return closes the work queue, which lets the pool
    /// wind down.
    pub async fn run(
        mut self,
        mut outcomes: OutcomeReceivers,
    ) -> (ResultStore<D::Value>, RunStats) {
        let inflight = self.inflight.clone();

        loop {
            // Unbiased: tokio picks a random ready branch, so neither queue starves.
            tokio::select! {
                Some(delivery) = outcomes.success.recv() => self.on_success(delivery),
                Some(delivery) = outcomes.failure.recv() => self.on_failure(delivery),
                () = inflight.wait_idle() => break,
                else => break,
            }
        }

        debug!(stored = self.store.len(), "aggregator finished");
        (self.store, self.stats)
    }

    fn on_success(&mut self, delivery: Delivery<Success>) {
        let Delivery {
            outcome: Success {
                id,
                payload,
                latency,
            },
            token,
        } = delivery;
        self.stats.record_latency(latency);

        match self.decoder.decode(&payload) {
            Ok(value) => {
                if self.store.insert(id, value).is_some() {
                    warn!(%id, "result already stored, overwriting");
                }
                self.stats.committed += 1;
                self.metrics.committed.add(1, &[]);
            }
            Err(e) => {
                // Not retried: the same bytes would come back.
                debug!(%id, error = %e, "undecodable payload, dropping");
                self.stats.undecodable += 1;
                self.metrics
                    .dropped
                    .add(1, &[KeyValue::new("reason", "undecodable")]);
            }
        }

        drop(token);
    }

    fn on_failure(&mut self, delivery: Delivery<Failure>) {
        let Delivery {
            outcome: Failure { mut item },
            token,
        } = delivery;
        item.attempts += 1;

        if item.attempts <= self.retry_limit {
            info!(id = %item.id, attempt = item.attempts, "retrying");
            // The respawn takes its own token before ours is released below.
            match self.dispatcher.respawn(item) {
                Ok(()) => {
                    self.stats.retried += 1;
                    self.metrics.retries.add(1, &[]);
                }
                Err(e) => warn!(id = %item.id, "respawn failed: {e}"),
            }
        } else {
            warn!(id = %item.id, attempts = item.attempts, "retries exhausted, dropping");
            self.stats.exhausted += 1;
            self.metrics
                .dropped
                .add(1, &[KeyValue::new("reason", "exhausted")]);
        }

        drop(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::JsonDecoder;
    use crate::engine::channel::outcome_channels;
    use crate::engine::dispatch::Job;
    use crate::model::{Item, ItemId, Outcome};
    use std::time::Duration;

    fn setup(
        retry_limit: u32,
    ) -> (
        Aggregator<JsonDecoder<u32>>,
        InFlight,
        tokio::sync::mpsc::UnboundedReceiver<Job>,
    ) {
        let inflight = InFlight::new();
        let (dispatcher, jobs) = Dispatcher::new(inflight.clone());
        let aggregator = Aggregator::new(
            Arc::new(JsonDecoder::new()),
            dispatcher,
            inflight.clone(),
            retry_limit,
            EngineMetrics::new(),
        );
        (aggregator, inflight, jobs)
    }

    #[test]
    fn failure_under_limit_respawns_before_releasing() {
        let (mut aggregator, inflight, mut jobs) = setup(3);
        let item = Item {
            id: ItemId(2),
            attempts: 1,
        };

        aggregator.on_failure(Delivery {
            outcome: Failure { item },
            token: inflight.acquire(),
        });

        let respawned = jobs.try_recv().unwrap();
        assert_eq!(respawned.item.attempts, 2);
        assert_eq!(inflight.in_flight(), 1);
        assert_eq!(aggregator.stats.retried, 1);
    }

    #[test]
    fn failure_at_limit_drops_item() {
        let (mut aggregator, inflight, mut jobs) = setup(3);
        let item = Item {
            id: ItemId(2),
            attempts: 3,
        };

        aggregator.on_failure(Delivery {
            outcome: Failure { item },
            token: inflight.acquire(),
        });

        assert!(jobs.try_recv().is_err());
        assert!(inflight.is_idle());
        assert_eq!(aggregator.stats.exhausted, 1);
    }

    #[test]
    fn undecodable_success_is_not_retried() {
        let (mut aggregator, inflight, mut jobs) = setup(3);

        aggregator.on_success(Delivery {
            outcome: Success {
                id: ItemId(1),
                payload: b"not json".to_vec(),
                latency: Duration::from_millis(5),
            },
            token: inflight.acquire(),
        });

        assert!(jobs.try_recv().is_err());
        assert!(aggregator.store.is_empty());
        assert_eq!(aggregator.stats.undecodable, 1);
        assert!(inflight.is_idle());
    }

    #[tokio::test]
    async fn both_queues_drain_when_loaded_together() {
        let (aggregator, inflight, mut jobs) = setup(1);
        let (senders, receivers) = outcome_channels();

        // Interleave so both queues are non-empty for the whole run.
        for id in 1..=500u64 {
            senders.post(
                Outcome::Success(Success {
                    id: ItemId(id),
                    payload: id.to_string().into_bytes(),
                    latency: Duration::from_millis(1),
                }),
                inflight.acquire(),
            );
            senders.post(
                Outcome::Failure(Failure {
                    item: Item {
                        id: ItemId(1000 + id),
                        attempts: 1,
                    },
                }),
                inflight.acquire(),
            );
        }

        let (store, stats) =
            tokio::time::timeout(Duration::from_secs(5), aggregator.run(receivers))
                .await
                .expect("aggregator should drain both queues");

        assert_eq!(store.len(), 500);
        assert_eq!(store.get(ItemId(250)), Some(&250));
        assert_eq!(stats.committed, 500);
        assert_eq!(stats.exhausted, 500);
        assert_eq!(stats.retried, 0);
        assert!(jobs.try_recv().is_err());
        assert_eq!(inflight.snapshot().released, 1000);
        assert!(inflight.is_idle());
    }

    #[tokio::test]
    async fn run_exits_once_idle_and_returns_store() {
        let (aggregator, inflight, _jobs) = setup(0);
        let (senders, receivers) = outcome_channels();

        senders.post(
            Outcome::Success(Success {
                id: ItemId(5),
                payload: b"42".to_vec(),
                latency: Duration::from_millis(1),
            }),
            inflight.acquire(),
        );
        senders.post(
            Outcome::Failure(Failure { item: Item::new(6) }),
            inflight.acquire(),
        );

        let (store, stats) =
            tokio::time::timeout(Duration::from_secs(1), aggregator.run(receivers))
                .await
                .expect("aggregator should finish");
        assert_eq!(store.get(ItemId(5)), Some(&42));
        assert!(!store.contains(ItemId(6)));
        assert_eq!(stats.committed, 1);
        assert_eq!(stats.exhausted, 1);
    }
}
