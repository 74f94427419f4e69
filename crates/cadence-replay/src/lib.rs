//! Deterministic trace recording and comparison for Cadence simulations.
//!
//! A simulation run is summarized as a sequence of [`StepTrace`]s (one
//! per processed instant). Re-running the same system over the same
//! stimulus schedule must reproduce the trace bit for bit; the
//! [`compare`] module verifies that, with an FNV-1a hash fast path and
//! an exact fallback locating the first divergence.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod compare;
pub mod hash;
pub mod trace;

pub use compare::{compare_traces, Divergence};
pub use hash::trace_hash;
pub use trace::{StepTrace, TraceEmission, TraceRecorder};
