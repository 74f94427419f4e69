//! Trace comparison and divergence reporting.
//!
//! Hash-first comparison (fast path) with an exact walk on mismatch
//! that locates the first diverging step and emission.

use cadence_core::Timestamp;

use crate::hash::trace_hash;
use crate::trace::{StepTrace, TraceEmission};

/// The first difference between a recorded and a replayed trace.
#[derive(Clone, Debug, PartialEq)]
pub enum Divergence {
    /// The traces contain different numbers of processed instants.
    LengthMismatch {
        /// Instants in the recorded trace.
        recorded: usize,
        /// Instants in the replayed trace.
        replayed: usize,
    },
    /// One step was processed at different instants.
    TimeMismatch {
        /// Index of the diverging step.
        step: usize,
        /// Instant in the recorded trace.
        recorded: Timestamp,
        /// Instant in the replayed trace.
        replayed: Timestamp,
    },
    /// One step emitted differently.
    EmissionMismatch {
        /// Index of the diverging step.
        step: usize,
        /// Index of the first diverging emission within the step; the
        /// emission lists may also differ in length, in which case this
        /// is the shorter length.
        emission: usize,
        /// The recorded emission at that position, if present.
        recorded: Option<TraceEmission>,
        /// The replayed emission at that position, if present.
        replayed: Option<TraceEmission>,
    },
}

/// Compare two traces.
///
/// Returns `None` when they match bit for bit. The hash fast path
/// covers the common case; on mismatch the exact walk pinpoints the
/// first diverging step and emission.
pub fn compare_traces(recorded: &[StepTrace], replayed: &[StepTrace]) -> Option<Divergence> {
    if trace_hash(recorded) == trace_hash(replayed) {
        return None;
    }

    if recorded.len() != replayed.len() {
        return Some(Divergence::LengthMismatch {
            recorded: recorded.len(),
            replayed: replayed.len(),
        });
    }

    for (step, (a, b)) in recorded.iter().zip(replayed).enumerate() {
        if a.time != b.time {
            return Some(Divergence::TimeMismatch {
                step,
                recorded: a.time,
                replayed: b.time,
            });
        }
        let shared = a.emissions.len().min(b.emissions.len());
        for i in 0..shared {
            if a.emissions[i] != b.emissions[i] {
                return Some(Divergence::EmissionMismatch {
                    step,
                    emission: i,
                    recorded: Some(a.emissions[i].clone()),
                    replayed: Some(b.emissions[i].clone()),
                });
            }
        }
        if a.emissions.len() != b.emissions.len() {
            return Some(Divergence::EmissionMismatch {
                step,
                emission: shared,
                recorded: a.emissions.get(shared).cloned(),
                replayed: b.emissions.get(shared).cloned(),
            });
        }
    }

    // Hashes differed but the walk found nothing: impossible unless the
    // hash itself is broken.
    None
}
