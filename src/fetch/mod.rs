//! Fetch collaborator: one remote read for one identifier.
//!
//! The engine only needs "give me the bytes for this id within this deadline".
//! Everything about the wire call lives behind [`Fetcher`].

pub mod http;

pub use http::HttpFetcher;

use crate::error::Result;
use crate::model::ItemId;
use std::future::Future;
use std::time::Duration;

/// A source of raw payloads keyed by identifier.
///
/// Any `Err` is treated as a retryable failure by the engine; implementations
/// need not distinguish transport errors from bad status codes.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(
        &self,
        id: ItemId,
        deadline: Duration,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;
}
