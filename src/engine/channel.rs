//! The outcome channel pair: workers post, the aggregator drains.

use super::inflight::WorkToken;
use crate::model::{Failure, Outcome, Success};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::debug;

/// An outcome in transit, still holding its attempt's token.
#[derive(Debug)]
pub struct Delivery<T> {
    pub outcome: T,
    pub(crate) token: WorkToken,
}

/// Worker side of the pair.
#[derive(Debug, Clone)]
pub struct OutcomeSenders {
    success: UnboundedSender<Delivery<Success>>,
    failure: UnboundedSender<Delivery<Failure>>,
}

/// Aggregator side of the pair.
#[derive(Debug)]
pub struct OutcomeReceivers {
    pub(crate) success: UnboundedReceiver<Delivery<Success>>,
    pub(crate) failure: UnboundedReceiver<Delivery<Failure>>,
}

pub fn outcome_channels() -> (OutcomeSenders, OutcomeReceivers) {
    let (success_tx, success_rx) = unbounded_channel();
    let (failure_tx, failure_rx) = unbounded_channel();
    (
        OutcomeSenders {
            success: success_tx,
            failure: failure_tx,
        },
        OutcomeReceivers {
            success: success_rx,
            failure: failure_rx,
        },
    )
}

impl OutcomeSenders {
    /// Route one outcome to its queue.
    ///
    /// If the aggregator is gone the delivery is dropped, which releases the
    /// token with it.
    pub(crate) fn post(&self, outcome: Outcome, token: WorkToken) {
        let id = outcome.id();
        let sent = match outcome {
            Outcome::Success(outcome) => self.success.send(Delivery { outcome, token }).is_ok(),
            Outcome::Failure(outcome) => self.failure.send(Delivery { outcome, token }).is_ok(),
        };
        if !sent {
            debug!(%id, "aggregator gone, discarding outcome");
        }
    }
}
