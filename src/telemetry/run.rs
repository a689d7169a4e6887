//! Run and attempt span helpers.

use crate::model::{ItemId, RunId};
use tracing::Span;

/// Start the span wrapping a whole engine run.
///
/// Totals are declared empty and filled by [`record_run_totals`].
pub fn start_run_span(run_id: &RunId) -> Span {
    tracing::info_span!(
        "fetch.run",
        "run.id" = %run_id,
        "run.seeded" = tracing::field::Empty,
        "run.committed" = tracing::field::Empty,
    )
}

pub fn record_run_totals(span: &Span, seeded: u64, committed: u64) {
    span.record("run.seeded", seeded);
    span.record("run.committed", committed);
}

/// Start the span for one attempt. `attempt` is 1-based.
pub fn start_attempt_span(id: ItemId, attempt: u32) -> Span {
    tracing::debug_span!(
        "fetch.attempt",
        "item.id" = id.0,
        "attempt" = attempt,
        "attempt.result" = tracing::field::Empty,
    )
}

/// Record how an attempt ended ("success" | "failure").
pub fn record_attempt_result(span: &Span, result: &str) {
    span.record("attempt.result", result);
}
