//! History-access traits used by equation evaluation.
//!
//! These traits decouple the compute context from the storage crate:
//! equations read committed history through `&dyn HistoryReader` and
//! stage writes through `&mut dyn StageWriter`, which also enables
//! mock-based testing of equation code without an arena.

use crate::id::VarId;
use crate::time::Timestamp;

/// Read-only access to committed variable history.
///
/// Shift 0 addresses the most recently committed value, −1 the value
/// committed one step earlier, and so on. `None` means the id is
/// unknown or the shift exceeds the retained window; callers translate
/// that into a diagnostic carrying the variable's name.
pub trait HistoryReader {
    /// The committed value at the given non-positive shift.
    fn read(&self, var: VarId, shift: i32) -> Option<f64>;

    /// The instant of the variable's most recent committed write.
    fn last_update(&self, var: VarId) -> Option<Timestamp>;

    /// Number of committed entries currently retained for the variable.
    ///
    /// Returns `None` for unknown ids. Used for error reporting when a
    /// read overruns the window.
    fn retained(&self, var: VarId) -> Option<usize>;
}

/// Staged-write access for the current compute step.
///
/// Writes accumulate in a pending area and reach committed history only
/// if the whole step succeeds; a failed step discards them.
pub trait StageWriter {
    /// Stage a value for the variable. Re-staging the same id within a
    /// step overwrites the pending value. Returns `false` for unknown
    /// ids.
    fn stage(&mut self, var: VarId, value: f64) -> bool;

    /// The value staged for the variable in the current step, if any.
    fn staged(&self, var: VarId) -> Option<f64>;
}
