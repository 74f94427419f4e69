//! Test utilities and mock types for Cadence development.
//!
//! Provides mock implementations of the history-access traits
//! ([`HistoryReader`], [`StageWriter`]) and canned equation models for
//! scheduler and simulator testing.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod fixtures;

pub use fixtures::{ConstantModel, EchoModel, FailingModel};

use std::collections::HashMap;

use cadence_core::{HistoryReader, StageWriter, Timestamp, VarId};

/// Mock implementation of [`HistoryReader`].
///
/// Backed by per-variable value lists, newest first. Pre-populate with
/// [`set_history`](MockHistoryReader::set_history) before passing to
/// code under test.
pub struct MockHistoryReader {
    histories: HashMap<u32, Vec<f64>>,
    last_updates: HashMap<u32, Timestamp>,
}

impl MockHistoryReader {
    pub fn new() -> Self {
        Self {
            histories: HashMap::new(),
            last_updates: HashMap::new(),
        }
    }

    /// Set a variable's committed values, newest first: `values[0]` is
    /// shift 0, `values[1]` shift −1, and so on.
    pub fn set_history(&mut self, var: VarId, values: Vec<f64>) {
        self.histories.insert(var.0, values);
    }

    /// Set the instant of the variable's most recent commit.
    pub fn set_last_update(&mut self, var: VarId, time: Timestamp) {
        self.last_updates.insert(var.0, time);
    }
}

impl Default for MockHistoryReader {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryReader for MockHistoryReader {
    fn read(&self, var: VarId, shift: i32) -> Option<f64> {
        if shift > 0 {
            return None;
        }
        let values = self.histories.get(&var.0)?;
        values.get(shift.unsigned_abs() as usize).copied()
    }

    fn last_update(&self, var: VarId) -> Option<Timestamp> {
        self.last_updates.get(&var.0).copied()
    }

    fn retained(&self, var: VarId) -> Option<usize> {
        self.histories.get(&var.0).map(Vec::len)
    }
}

/// Mock implementation of [`StageWriter`].
///
/// Accepts stages for ids below `elements`; inspect results with
/// [`staged`](StageWriter::staged).
pub struct MockStageWriter {
    staged: HashMap<u32, f64>,
    elements: u32,
}

impl MockStageWriter {
    pub fn new(elements: u32) -> Self {
        Self {
            staged: HashMap::new(),
            elements,
        }
    }

    /// Number of values staged so far.
    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }
}

impl StageWriter for MockStageWriter {
    fn stage(&mut self, var: VarId, value: f64) -> bool {
        if var.0 < self.elements {
            self.staged.insert(var.0, value);
            true
        } else {
            false
        }
    }

    fn staged(&self, var: VarId) -> Option<f64> {
        self.staged.get(&var.0).copied()
    }
}
