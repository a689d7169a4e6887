//! Attempt worker: one fetch for one item, one outcome posted.

use super::channel::OutcomeSenders;
use super::dispatch::Job;
use crate::error::Error;
use crate::fetch::Fetcher;
use crate::model::{Failure, Item, Outcome, Success};
use crate::telemetry::metrics::EngineMetrics;
use crate::telemetry::run::{record_attempt_result, start_attempt_span};
use opentelemetry::KeyValue;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OwnedSemaphorePermit;
use tracing::{Instrument, debug};

/// Run a single attempt under its own deadline.
///
/// Every error, including the deadline firing, becomes `Failure{item}` with
/// the attempt count untouched.
pub async fn attempt<F: Fetcher>(fetcher: &F, item: Item, deadline: Duration) -> Outcome {
    let start = Instant::now();
    let result = match tokio::time::timeout(deadline, fetcher.fetch(item.id, deadline)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Deadline(deadline)),
    };

    match result {
        Ok(payload) => Outcome::Success(Success {
            id: item.id,
            payload,
            latency: start.elapsed(),
        }),
        Err(e) => {
            debug!(id = %item.id, attempt = item.attempts + 1, error = %e, "attempt failed");
            Outcome::Failure(Failure { item })
        }
    }
}

/// Worker task body. Holds a pool slot until its outcome is posted.
pub(crate) async fn run<F: Fetcher>(
    job: Job,
    _slot: OwnedSemaphorePermit,
    fetcher: Arc<F>,
    outcomes: OutcomeSenders,
    deadline: Duration,
    metrics: EngineMetrics,
) {
    let Job { item, token } = job;
    let span = start_attempt_span(item.id, item.attempts + 1);

    async {
        let outcome = attempt(fetcher.as_ref(), item, deadline).await;

        let result = match &outcome {
            Outcome::Success(success) => {
                metrics
                    .fetch_latency_ms
                    .record(success.latency.as_secs_f64() * 1000.0, &[]);
                "success"
            }
            Outcome::Failure(_) => "failure",
        };
        record_attempt_result(&tracing::Span::current(), result);
        metrics
            .attempts
            .add(1, &[KeyValue::new("result", result)]);

        outcomes.post(outcome, token);
    }
    .instrument(span)
    .await
}
