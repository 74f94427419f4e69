//! Reference equation models for the Cadence synchronization engine.
//!
//! Sources produce trajectories on their own clock; recurrences combine
//! their own history with external references; aggregators fold an
//! arbitrary number of auto-discovered inputs under `all_sync`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod aggregators;
pub mod recurrence;
pub mod sources;

pub use aggregators::{Mean, Sum, WeightedProduct};
pub use recurrence::{Accumulator, Smoother};
pub use sources::{NoiseSource, RampSource, StepSource};
