//! Strongly-typed variable identifiers.

use std::fmt;

/// Identifies a variable within one model's arena.
///
/// Variables are declared at model construction and assigned sequential
/// ids in declaration order. A vector variable of dimension N occupies N
/// consecutive ids starting at its base; `VarId(base + i)` addresses
/// element `i`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u32);

impl VarId {
    /// The id of element `i` relative to this base id.
    ///
    /// Element bounds are validated at declaration time; this is plain
    /// offset arithmetic.
    pub fn element(self, i: u32) -> VarId {
        VarId(self.0 + i)
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for VarId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
