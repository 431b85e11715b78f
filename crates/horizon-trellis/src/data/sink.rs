//! The outbound boundary towards the browser widget.
//!
//! The data-binding core does not speak the wire protocol itself; the
//! surrounding UI-tree layer does. What the core produces is (a) item-diff
//! batches and (b) count updates, delivered through a [`ClientSink`] as two
//! distinguishable calls. The payload types serialize to the JSON shapes the
//! protocol layer forwards.

use parking_lot::Mutex;
use serde_json::{Map, Value};

/// One added or updated row within a pushed window.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ItemChange {
    /// Absolute index of the row in the (filtered, sorted) item set.
    pub index: usize,
    /// The row's correlation key.
    pub key: String,
    /// Properties produced by the registered data generators.
    pub data: Map<String, Value>,
}

/// A coalesced item diff for one processing turn.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct UpdateBatch {
    /// First index of the pushed window.
    pub start: usize,
    /// Rows the client must add or replace.
    pub items: Vec<ItemChange>,
    /// Keys the client must forget.
    pub removed: Vec<String>,
    /// Whether the client must drop all rows before applying `items`.
    pub clear: bool,
}

impl UpdateBatch {
    /// Whether the batch carries nothing worth sending.
    pub fn is_empty(&self) -> bool {
        !self.clear && self.items.is_empty() && self.removed.is_empty()
    }
}

/// How authoritative a pushed count is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CountMode {
    /// The count is exact.
    Exact,
    /// The count is a working estimate that may still grow.
    Estimated,
    /// The count is unknown; the value is a provisional scroll bound.
    Unknown,
}

/// A count update, pushed separately from item data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CountUpdate {
    /// The item count under the current server-side filter.
    pub count: usize,
    /// How authoritative `count` is.
    pub mode: CountMode,
}

/// Receives the core's outbound pushes.
///
/// Implemented by the UI-tree layer that owns the browser connection. Both
/// methods are called on the owning UI's processing turn, at most once each
/// per [`flush`](super::DataCommunicator::flush); implementations must not
/// call back into the communicator synchronously.
pub trait ClientSink: Send + Sync {
    /// Delivers a coalesced item diff.
    fn push_update(&self, batch: UpdateBatch);

    /// Delivers a count update.
    fn push_count(&self, update: CountUpdate);
}

/// A sink that discards everything.
///
/// Useful for components that are constructed but never bound to a client.
pub struct NullSink;

impl ClientSink for NullSink {
    fn push_update(&self, _batch: UpdateBatch) {}

    fn push_count(&self, _update: CountUpdate) {}
}

/// A sink that records every push for later inspection.
///
/// Intended for headless tests of components and the communicator.
#[derive(Default)]
pub struct RecordingSink {
    updates: Mutex<Vec<UpdateBatch>>,
    counts: Mutex<Vec<CountUpdate>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All item batches pushed so far, oldest first.
    pub fn updates(&self) -> Vec<UpdateBatch> {
        self.updates.lock().clone()
    }

    /// All count updates pushed so far, oldest first.
    pub fn counts(&self) -> Vec<CountUpdate> {
        self.counts.lock().clone()
    }

    /// The most recent count update, if any.
    pub fn last_count(&self) -> Option<CountUpdate> {
        self.counts.lock().last().copied()
    }

    /// Number of item batches pushed so far.
    pub fn update_count(&self) -> usize {
        self.updates.lock().len()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.updates.lock().clear();
        self.counts.lock().clear();
    }
}

impl ClientSink for RecordingSink {
    fn push_update(&self, batch: UpdateBatch) {
        self.updates.lock().push(batch);
    }

    fn push_count(&self, update: CountUpdate) {
        self.counts.lock().push(update);
    }
}
