//! Declaration-ordered variable arena with staged-write commit.
//!
//! [`VarArena`] owns every variable element of one model. Ids are
//! assigned sequentially in declaration order; a vector declaration of
//! dimension N occupies N consecutive ids. Writes made during a compute
//! step accumulate in a staging area and reach committed history only
//! on [`commit`](VarArena::commit) — a failed step calls
//! [`discard`](VarArena::discard) and leaves history untouched.

use indexmap::IndexMap;

use cadence_core::{HistoryPolicy, HistoryReader, StageWriter, Timestamp, VarDef, VarId, VarSet};

use crate::error::HistoryError;
use crate::variable::Variable;

/// One declaration as stored by the arena.
#[derive(Clone, Debug)]
struct DeclEntry {
    base: u32,
    def: VarDef,
}

/// Committed history for every declared variable element.
///
/// Split from the staging area so equation evaluation can hold a shared
/// reference to committed history while staging writes mutably.
#[derive(Debug, Default)]
pub struct HistoryStore {
    decls: IndexMap<String, DeclEntry>,
    vars: Vec<Variable>,
    labels: Vec<String>,
}

impl HistoryStore {
    /// Resolve a declared name to its base id and definition.
    pub fn resolve(&self, name: &str) -> Option<(VarId, &VarDef)> {
        self.decls.get(name).map(|d| (VarId(d.base), &d.def))
    }

    /// Display label for an element id (`name` or `name[i]`).
    pub fn label(&self, var: VarId) -> Option<&str> {
        self.labels.get(var.0 as usize).map(String::as_str)
    }

    /// Total number of declared elements.
    pub fn element_count(&self) -> usize {
        self.vars.len()
    }

    /// Declarations in declaration order: `(name, base id, def)`.
    pub fn decls(&self) -> impl Iterator<Item = (&str, VarId, &VarDef)> {
        self.decls
            .iter()
            .map(|(name, d)| (name.as_str(), VarId(d.base), &d.def))
    }

    fn var(&self, var: VarId) -> Option<&Variable> {
        self.vars.get(var.0 as usize)
    }
}

impl HistoryReader for HistoryStore {
    fn read(&self, var: VarId, shift: i32) -> Option<f64> {
        self.var(var)?.read(shift)
    }

    fn last_update(&self, var: VarId) -> Option<Timestamp> {
        self.var(var)?.last_update()
    }

    fn retained(&self, var: VarId) -> Option<usize> {
        self.var(var).map(Variable::retained)
    }
}

/// Pending writes for the current step.
///
/// Re-staging the same id overwrites the pending value; entries keep
/// their first-staged order for deterministic commits.
#[derive(Debug, Default)]
pub struct StagedWrites {
    entries: IndexMap<u32, f64>,
    elements: usize,
}

impl StagedWrites {
    /// Pending entries in first-staged order.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.entries.iter().map(|(&id, &v)| (VarId(id), v))
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StageWriter for StagedWrites {
    fn stage(&mut self, var: VarId, value: f64) -> bool {
        if (var.0 as usize) < self.elements {
            self.entries.insert(var.0, value);
            true
        } else {
            false
        }
    }

    fn staged(&self, var: VarId) -> Option<f64> {
        self.entries.get(&var.0).copied()
    }
}

/// The arena: committed history plus the staging area.
#[derive(Debug, Default)]
pub struct VarArena {
    store: HistoryStore,
    staged: StagedWrites,
}

impl VarArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable, allocating one element per dimension slot.
    ///
    /// Returns the base id. Fails on duplicate names, zero dimension,
    /// or a bounded history retaining zero entries.
    pub fn declare(&mut self, def: &VarDef) -> Result<VarId, HistoryError> {
        if def.dimension == 0 {
            return Err(HistoryError::ZeroDimension {
                name: def.name.clone(),
            });
        }
        if def.history == HistoryPolicy::Bounded(0) {
            return Err(HistoryError::ZeroDepth {
                name: def.name.clone(),
            });
        }
        if self.store.decls.contains_key(&def.name) {
            return Err(HistoryError::DuplicateVariable {
                name: def.name.clone(),
            });
        }

        let base = self.store.vars.len() as u32;
        for i in 0..def.dimension {
            self.store.vars.push(Variable::new(def.history));
            let label = if def.dimension == 1 {
                def.name.clone()
            } else {
                format!("{}[{i}]", def.name)
            };
            self.store.labels.push(label);
        }
        self.store.decls.insert(
            def.name.clone(),
            DeclEntry {
                base,
                def: def.clone(),
            },
        );
        self.staged.elements = self.store.vars.len();
        Ok(VarId(base))
    }

    /// Resolve a declared name to its base id and definition.
    pub fn resolve(&self, name: &str) -> Option<(VarId, &VarDef)> {
        self.store.resolve(name)
    }

    /// Display label for an element id.
    pub fn label(&self, var: VarId) -> Option<&str> {
        self.store.label(var)
    }

    /// Total number of declared elements.
    pub fn element_count(&self) -> usize {
        self.store.element_count()
    }

    /// Commit an externally received value directly to history.
    ///
    /// Used by the scheduler when applying bag values; repeated applies
    /// at the same instant overwrite the head (idempotent-per-instant).
    pub fn apply(&mut self, var: VarId, value: f64, time: Timestamp) -> Result<(), HistoryError> {
        match self.store.vars.get_mut(var.0 as usize) {
            Some(v) => {
                v.record(value, time);
                Ok(())
            }
            None => Err(HistoryError::UnknownVariable {
                name: format!("#{var}"),
            }),
        }
    }

    /// Committed value at a non-positive shift.
    pub fn read(&self, var: VarId, shift: i32) -> Option<f64> {
        self.store.read(var, shift)
    }

    /// Instant of the element's most recent commit.
    pub fn last_update(&self, var: VarId) -> Option<Timestamp> {
        self.store.last_update(var)
    }

    /// Committed history plus the mutable staging area, borrowed
    /// disjointly for equation evaluation.
    pub fn split(&mut self) -> (&HistoryStore, &mut StagedWrites) {
        (&self.store, &mut self.staged)
    }

    /// Committed history only.
    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Pending staged entries in first-staged order.
    pub fn staged_entries(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.staged.iter()
    }

    /// Commit all staged writes at the given instant.
    ///
    /// Returns the set of element ids that were committed.
    pub fn commit(&mut self, time: Timestamp) -> VarSet {
        let mut changed = VarSet::new();
        for (id, value) in self.staged.entries.drain(..) {
            self.store.vars[id as usize].record(value, time);
            changed.insert(VarId(id));
        }
        changed
    }

    /// Drop all staged writes, leaving committed history untouched.
    pub fn discard(&mut self) {
        self.staged.entries.clear();
    }
}
