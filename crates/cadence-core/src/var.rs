//! Variable declarations and the [`VarSet`] bitset.

use smallvec::{smallvec, SmallVec};

use crate::id::VarId;

/// Synchronization mode of an external (cross-model) variable reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncMode {
    /// Recomputation must not proceed until a value for the current
    /// instant has been received. A missing value at the model's own
    /// time advance is a fatal dependency error.
    Sync,
    /// An arrival triggers a recomputation at the arrival instant using
    /// the latest received value; absence never stalls the model.
    Async,
    /// Arrivals are recorded but never trigger recomputation by
    /// themselves; the value is visible whenever something else causes
    /// a recomputation.
    Nosync,
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync => write!(f, "sync"),
            Self::Async => write!(f, "async"),
            Self::Nosync => write!(f, "nosync"),
        }
    }
}

/// Whether a variable is owned by the declaring model or a read-only
/// view of another model's variable.
#[derive(Clone, Debug, PartialEq)]
pub enum VarRole {
    /// Owned: written by this model's `compute`/`init`, published on an
    /// output port of the same name.
    Owned {
        /// Seed for `history[0]`, applied before the model's `init`
        /// hook runs. `None` seeds 0.0 unless `init` overwrites it.
        init: Option<f64>,
    },
    /// External: written only by the scheduler when applying received
    /// values; readable by `compute`, never writable.
    External {
        /// The synchronization contract for this reference.
        mode: SyncMode,
    },
}

/// Retention policy for a variable's committed history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryPolicy {
    /// Retain the most recent `depth` committed values. `depth` must be
    /// at least 1; the default of 2 covers shift −1.
    Bounded(usize),
    /// Retain every committed value. Used for unbounded-history
    /// variables that are scanned over their whole trajectory.
    Unbounded,
}

impl HistoryPolicy {
    /// Default bounded depth: the current value plus one step back.
    pub const DEFAULT_DEPTH: usize = 2;
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        HistoryPolicy::Bounded(Self::DEFAULT_DEPTH)
    }
}

/// Declaration of one variable (owned or external) of a model.
///
/// Declarations are produced once by `EquationModel::variables()` and
/// fixed for the model's lifetime. Declaration order is significant: it
/// determines [`VarId`] assignment, external iteration order, and
/// output emission order.
#[derive(Clone, Debug, PartialEq)]
pub struct VarDef {
    /// Variable name; doubles as the input/output port name.
    pub name: String,
    /// Owned or external, with role-specific configuration.
    pub role: VarRole,
    /// Number of elements. 1 for scalars; N declares a vector whose
    /// elements occupy N consecutive ids.
    pub dimension: u32,
    /// Committed-history retention.
    pub history: HistoryPolicy,
}

impl VarDef {
    /// Declare an owned scalar with default history.
    pub fn owned(name: &str) -> Self {
        Self {
            name: name.to_string(),
            role: VarRole::Owned { init: None },
            dimension: 1,
            history: HistoryPolicy::default(),
        }
    }

    /// Declare an owned scalar seeded with `init`.
    pub fn owned_init(name: &str, init: f64) -> Self {
        Self {
            name: name.to_string(),
            role: VarRole::Owned { init: Some(init) },
            dimension: 1,
            history: HistoryPolicy::default(),
        }
    }

    /// Declare an external scalar reference with the given mode.
    pub fn external(name: &str, mode: SyncMode) -> Self {
        Self {
            name: name.to_string(),
            role: VarRole::External { mode },
            dimension: 1,
            history: HistoryPolicy::default(),
        }
    }

    /// Replace the dimension, turning the declaration into a vector.
    pub fn with_dimension(mut self, dimension: u32) -> Self {
        self.dimension = dimension;
        self
    }

    /// Replace the history policy.
    pub fn with_history(mut self, history: HistoryPolicy) -> Self {
        self.history = history;
        self
    }

    /// Whether this declaration is owned.
    pub fn is_owned(&self) -> bool {
        matches!(self.role, VarRole::Owned { .. })
    }

    /// The sync mode, for external declarations.
    pub fn mode(&self) -> Option<SyncMode> {
        match self.role {
            VarRole::External { mode } => Some(mode),
            VarRole::Owned { .. } => None,
        }
    }
}

/// A set of variable ids implemented as a bitset.
///
/// Used to track which variables were committed by a compute step and
/// to drive declaration-ordered emission. Stays inline for models with
/// up to 64 variable elements; larger models spill to the heap.
#[derive(Clone, Debug, Default)]
pub struct VarSet {
    words: SmallVec<[u64; 1]>,
}

impl VarSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self { words: smallvec![] }
    }

    /// Insert a variable id. Idempotent.
    pub fn insert(&mut self, var: VarId) {
        let (word, bit) = Self::split(var);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << bit;
    }

    /// Remove a variable id if present.
    pub fn remove(&mut self, var: VarId) {
        let (word, bit) = Self::split(var);
        if let Some(w) = self.words.get_mut(word) {
            *w &= !(1 << bit);
        }
    }

    /// Whether the set contains `var`.
    pub fn contains(&self, var: VarId) -> bool {
        let (word, bit) = Self::split(var);
        self.words.get(word).is_some_and(|w| w & (1 << bit) != 0)
    }

    /// Remove all ids.
    pub fn clear(&mut self) {
        self.words.clear();
    }

    /// The union of `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        let longest = self.words.len().max(other.words.len());
        let words = (0..longest)
            .map(|i| self.word(i) | other.word(i))
            .collect();
        Self { words }
    }

    /// The intersection of `self` and `other`.
    pub fn intersection(&self, other: &Self) -> Self {
        let shortest = self.words.len().min(other.words.len());
        let words = (0..shortest)
            .map(|i| self.word(i) & other.word(i))
            .collect();
        Self { words }
    }

    /// Ids in `self` but not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        let words = (0..self.words.len())
            .map(|i| self.word(i) & !other.word(i))
            .collect();
        Self { words }
    }

    /// Number of ids in the set.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether the set contains no ids.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Iterate the ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = VarId> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &w)| {
            (0..64u32)
                .filter(move |&bit| w & (1u64 << bit) != 0)
                .map(move |bit| VarId(wi as u32 * 64 + bit))
        })
    }

    fn split(var: VarId) -> (usize, u32) {
        ((var.0 / 64) as usize, var.0 % 64)
    }

    fn word(&self, i: usize) -> u64 {
        self.words.get(i).copied().unwrap_or(0)
    }
}

impl PartialEq for VarSet {
    fn eq(&self, other: &Self) -> bool {
        let longest = self.words.len().max(other.words.len());
        (0..longest).all(|i| self.word(i) == other.word(i))
    }
}

impl Eq for VarSet {}

impl FromIterator<VarId> for VarSet {
    fn from_iter<I: IntoIterator<Item = VarId>>(iter: I) -> Self {
        let mut set = Self::new();
        for var in iter {
            set.insert(var);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn vardef_constructors() {
        let a = VarDef::owned_init("c", 1.0);
        assert!(a.is_owned());
        assert_eq!(a.mode(), None);
        assert_eq!(a.dimension, 1);

        let b = VarDef::external("b", SyncMode::Async).with_dimension(3);
        assert!(!b.is_owned());
        assert_eq!(b.mode(), Some(SyncMode::Async));
        assert_eq!(b.dimension, 3);
    }

    #[test]
    fn insert_remove_contains() {
        let mut set = VarSet::new();
        set.insert(VarId(3));
        set.insert(VarId(70));
        assert!(set.contains(VarId(3)));
        assert!(set.contains(VarId(70)));
        assert!(!set.contains(VarId(4)));
        set.remove(VarId(3));
        assert!(!set.contains(VarId(3)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn iter_is_ascending() {
        let set: VarSet = [VarId(65), VarId(2), VarId(40)].into_iter().collect();
        let ids: Vec<u32> = set.iter().map(|v| v.0).collect();
        assert_eq!(ids, vec![2, 40, 65]);
    }

    fn arb_var_set() -> impl Strategy<Value = VarSet> {
        prop::collection::vec(0u32..160, 0..24)
            .prop_map(|ids| ids.into_iter().map(VarId).collect::<VarSet>())
    }

    proptest! {
        #[test]
        fn union_commutative(a in arb_var_set(), b in arb_var_set()) {
            prop_assert_eq!(a.union(&b), b.union(&a));
        }

        #[test]
        fn intersection_commutative(a in arb_var_set(), b in arb_var_set()) {
            prop_assert_eq!(a.intersection(&b), b.intersection(&a));
        }

        #[test]
        fn union_identity(a in arb_var_set()) {
            prop_assert_eq!(a.union(&VarSet::new()), a.clone());
        }

        #[test]
        fn difference_disjoint_from_subtrahend(a in arb_var_set(), b in arb_var_set()) {
            let diff = a.difference(&b);
            for id in diff.iter() {
                prop_assert!(a.contains(id));
                prop_assert!(!b.contains(id));
            }
        }

        #[test]
        fn len_matches_iter_count(a in arb_var_set()) {
            prop_assert_eq!(a.len(), a.iter().count());
        }

        #[test]
        fn insert_then_contains(id in 0u32..512) {
            let mut set = VarSet::new();
            set.insert(VarId(id));
            prop_assert!(set.contains(VarId(id)));
            prop_assert_eq!(set.len(), 1);
        }
    }
}
