//! Dispatcher and the bounded worker pool behind it.
//!
//! Seeding and respawning both push onto the same work queue; the pool drains
//! it, one worker per job, never more than `concurrency` at once.

use super::channel::OutcomeSenders;
use super::inflight::{InFlight, WorkToken};
use super::worker;
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::model::{Item, ItemId};
use crate::telemetry::metrics::EngineMetrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error};

/// A pending attempt: the item plus its in-flight registration.
#[derive(Debug)]
pub struct Job {
    pub item: Item,
    pub(crate) token: WorkToken,
}

/// Registers attempts and queues them for the pool. Never waits on workers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    jobs: UnboundedSender<Job>,
    inflight: InFlight,
}

impl Dispatcher {
    pub fn new(inflight: InFlight) -> (Self, UnboundedReceiver<Job>) {
        let (jobs, rx) = unbounded_channel();
        (Self { jobs, inflight }, rx)
    }

    /// Queue a fresh `Item{id, attempts: 0}` for every id. Returns how many.
    pub fn seed(&self, ids: impl IntoIterator<Item = ItemId>) -> Result<usize> {
        let mut seeded = 0;
        for id in ids {
            self.submit(Item::new(id))?;
            seeded += 1;
        }
        Ok(seeded)
    }

    /// Queue another attempt for an item that already failed.
    pub fn respawn(&self, item: Item) -> Result<()> {
        self.submit(item)
    }

    fn submit(&self, item: Item) -> Result<()> {
        let token = self.inflight.acquire();
        // On a closed queue the job, and with it the token, is dropped here.
        self.jobs
            .send(Job { item, token })
            .map_err(|_| Error::Other(format!("work queue closed, item {} not queued", item.id)))
    }
}

/// Fixed-size pool turning queued jobs into worker tasks.
pub struct WorkerPool<F> {
    fetcher: Arc<F>,
    outcomes: OutcomeSenders,
    slots: Arc<Semaphore>,
    deadline: Duration,
    metrics: EngineMetrics,
}

impl<F: Fetcher> WorkerPool<F> {
    pub fn new(
        fetcher: Arc<F>,
        outcomes: OutcomeSenders,
        concurrency: usize,
        deadline: Duration,
        metrics: EngineMetrics,
    ) -> Self {
        Self {
            fetcher,
            outcomes,
            slots: Arc::new(Semaphore::new(concurrency.max(1))),
            deadline,
            metrics,
        }
    }

    /// Drain the work queue until every `Dispatcher` handle is dropped.
    pub async fn run(self, mut jobs: UnboundedReceiver<Job>) {
        let mut workers = JoinSet::new();

        loop {
            tokio::select! {
                job = jobs.recv() => {
                    let Some(job) = job else { break };
                    let slot = match Arc::clone(&self.slots).acquire_owned().await {
                        Ok(slot) => slot,
                        Err(e) => {
                            error!("worker pool closed: {e}");
                            break;
                        }
                    };
                    workers.spawn(
                        worker::run(
                            job,
                            slot,
                            Arc::clone(&self.fetcher),
                            self.outcomes.clone(),
                            self.deadline,
                            self.metrics.clone(),
                        )
                        .in_current_span(),
                    );
                }
                Some(joined) = workers.join_next() => {
                    if let Err(e) = joined {
                        // The token went down with the task, so accounting stays balanced.
                        error!("attempt worker aborted: {e}");
                    }
                }
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("attempt worker aborted: {e}");
            }
        }
        debug!("worker pool drained");
    }
}
