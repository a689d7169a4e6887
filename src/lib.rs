//! # photofetch
//!
//! Fetches a numbered set of remote resources concurrently, retries failed
//! attempts up to a limit, and aggregates the parsed results into one store.
//!
//! The engine is generic over a [`fetch::Fetcher`] and a [`decode::Decoder`];
//! the HTTP/JSON photo client is the default pairing.

pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod model;
pub mod report;
pub mod telemetry;
