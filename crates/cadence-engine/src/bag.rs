//! Same-instant notification merging.
//!
//! A [`Bag`] accumulates every external notification addressed to one
//! model at one simulated instant. Per variable element the last writer
//! wins, but the delivery count is retained so double-delivery bugs
//! stay observable. Entries keep first-arrival order for deterministic
//! application.

use indexmap::IndexMap;

use cadence_core::{Timestamp, VarId};

/// The merged state of one variable element within a bag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BagEntry {
    /// The value that will be applied (last writer wins).
    pub value: f64,
    /// Number of notifications merged into this entry.
    pub count: u32,
}

/// All external notifications for one model sharing one instant.
///
/// Applied atomically: every entry lands in its variable's history
/// before `compute` runs once.
#[derive(Clone, Debug)]
pub struct Bag {
    time: Timestamp,
    entries: IndexMap<u32, BagEntry>,
}

impl Bag {
    /// Open a bag for the given instant.
    pub fn new(time: Timestamp) -> Self {
        Self {
            time,
            entries: IndexMap::new(),
        }
    }

    /// The instant this bag collects for.
    pub fn time(&self) -> Timestamp {
        self.time
    }

    /// Merge one notification. A repeated delivery for the same element
    /// overwrites the pending value and bumps the count.
    pub fn merge(&mut self, var: VarId, value: f64) {
        self.entries
            .entry(var.0)
            .and_modify(|e| {
                e.value = value;
                e.count += 1;
            })
            .or_insert(BagEntry { value, count: 1 });
    }

    /// Entries in first-arrival order.
    pub fn entries(&self) -> impl Iterator<Item = (VarId, BagEntry)> + '_ {
        self.entries.iter().map(|(&id, &e)| (VarId(id), e))
    }

    /// Delivery count for one element (0 if absent).
    pub fn count(&self, var: VarId) -> u32 {
        self.entries.get(&var.0).map_or(0, |e| e.count)
    }

    /// Number of distinct elements in the bag.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total notifications beyond the first per element.
    pub fn duplicate_deliveries(&self) -> u32 {
        self.entries.values().map(|e| e.count - 1).sum()
    }
}
