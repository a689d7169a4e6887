//! In-flight accounting and completion detection.
//!
//! Every registered attempt holds one [`WorkToken`]. The token travels with
//! the job to the worker, rides along with the outcome, and is dropped by the
//! aggregator only after that outcome is fully handled. A respawn acquires
//! its own token before the old one is released, so the count cannot touch
//! zero while a retry is being scheduled.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Consistent view of the counters at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InFlightSnapshot {
    pub spawned: u64,
    pub released: u64,
    pub in_flight: u64,
}

#[derive(Debug, Default)]
struct Counts {
    spawned: u64,
    released: u64,
}

#[derive(Debug, Default)]
struct Inner {
    counts: Mutex<Counts>,
    idle: Notify,
}

/// Shared tracker of registered-but-unconsumed attempts.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    inner: Arc<Inner>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one attempt. The returned token releases it on drop.
    pub fn acquire(&self) -> WorkToken {
        self.counts().spawned += 1;
        WorkToken {
            tracker: self.clone(),
        }
    }

    pub fn snapshot(&self) -> InFlightSnapshot {
        let counts = self.counts();
        InFlightSnapshot {
            spawned: counts.spawned,
            released: counts.released,
            in_flight: counts.spawned - counts.released,
        }
    }

    pub fn in_flight(&self) -> u64 {
        self.snapshot().in_flight
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight() == 0
    }

    /// Block until every registered attempt has been released.
    ///
    /// Cancel safe. Queue emptiness plays no part here: only the token count
    /// decides completion.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // Register before checking so a release in between is not missed.
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    fn release(&self) {
        let idle = {
            let mut counts = self.counts();
            debug_assert!(counts.released < counts.spawned, "token released twice");
            counts.released += 1;
            counts.released == counts.spawned
        };
        if idle {
            self.inner.idle.notify_waiters();
        }
    }

    fn counts(&self) -> MutexGuard<'_, Counts> {
        // Counters stay consistent even if a holder panicked mid-update.
        self.inner
            .counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof that one attempt is still outstanding.
#[derive(Debug)]
#[must_use = "dropping a token marks its attempt as consumed"]
pub struct WorkToken {
    tracker: InFlight,
}

impl Drop for WorkToken {
    fn drop(&mut self) {
        self.tracker.release();
    }
}
