//! Core data model.
//!
//! An item is one identifier that needs fetching. Every attempt at it ends in
//! exactly one outcome, and successful outcomes land in the result store.

pub mod photo;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Newtype for remote resource identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Sequential identifiers `1..=total`, the working set of a full run.
pub fn sequential_ids(total: u64) -> impl Iterator<Item = ItemId> {
    (1..=total).map(ItemId)
}

/// Identity of one engine run, attached to its span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short display: first 8 chars of UUID
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// A unit of work: one identifier plus the failures it has accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Failed attempts processed so far. Only the aggregator bumps this.
    pub attempts: u32,
}

impl Item {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            attempts: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// A fetch that returned a body in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Success {
    pub id: ItemId,
    pub payload: Vec<u8>,
    pub latency: Duration,
}

/// A fetch that failed for any reason. The item is returned untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure {
    pub item: Item,
}

/// Result of a single attempt. Produced once by a worker, consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Success),
    Failure(Failure),
}

impl Outcome {
    pub fn id(&self) -> ItemId {
        match self {
            Outcome::Success(s) => s.id,
            Outcome::Failure(f) => f.item.id,
        }
    }
}

// ---------------------------------------------------------------------------
// Result store
// ---------------------------------------------------------------------------

/// Parsed values keyed by identifier, ordered for reporting.
///
/// Only the aggregator holds this mutably while a run is active; it is
/// handed to callers after completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultStore<V> {
    entries: BTreeMap<ItemId, V>,
}

impl<V> ResultStore<V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert or overwrite. Returns the previous value, if any.
    pub fn insert(&mut self, id: ItemId, value: V) -> Option<V> {
        self.entries.insert(id, value)
    }

    pub fn get(&self, id: ItemId) -> Option<&V> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &V)> {
        self.entries.iter().map(|(id, v)| (*id, v))
    }
}

impl<V> Default for ResultStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
