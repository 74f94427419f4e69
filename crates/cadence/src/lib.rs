//! Cadence: a discrete-time difference-equation synchronization engine.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Cadence sub-crates. For most users, adding `cadence` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use cadence::prelude::*;
//!
//! // A one-step recurrence: c = c(−1) + 1.
//! struct Counter;
//! impl EquationModel for Counter {
//!     fn name(&self) -> &str { "counter" }
//!     fn variables(&self) -> Vec<VarDef> {
//!         vec![VarDef::owned_init("c", 0.0)]
//!     }
//!     fn compute(&self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
//!         let prev = ctx.value(VarId(0), -1)?;
//!         ctx.set(VarId(0), prev + 1.0)
//!     }
//! }
//!
//! // Couple the counter to a smoother that follows it asynchronously.
//! let system = CoupledSystem::new()
//!     .model(ModelConfig::new("counter", Box::new(Counter)).with_time_step(1.0))
//!     .model(ModelConfig::new(
//!         "smooth",
//!         Box::new(cadence::models::Smoother::new("y", "x", SyncMode::Async, 0.5)),
//!     ))
//!     .couple("counter", "c", "smooth", "x");
//!
//! let mut sim = Simulator::new(system).unwrap();
//! sim.start(Timestamp::ZERO).unwrap();
//! sim.run_until(Timestamp(3.0)).unwrap();
//!
//! assert_eq!(sim.value("counter", "c", 0), Some(3.0));
//! assert_eq!(sim.value("smooth", "y", 0), Some(2.125));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cadence-core` | IDs, time, declarations, events, errors, traits |
//! | [`history`] | `cadence-history` | History buffers, variables, the arena |
//! | [`model`] | `cadence-model` | Equation trait, compute context, dependency set |
//! | [`engine`] | `cadence-engine` | Scheduler, bag, emitter, coupled simulator |
//! | [`models`] | `cadence-models` | Reference sources, recurrences, aggregators |
//! | [`replay`] | `cadence-replay` | Trace recording, hashing, comparison |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`cadence-core`).
///
/// Contains variable declarations, notifications, output events, error
/// types, and the history-access traits.
pub use cadence_core as types;

/// History storage (`cadence-history`).
///
/// Most users only need [`history::VarArena`] when embedding the
/// engine; equation code reads history through the compute context.
pub use cadence_history as history;

/// Equation trait and compute context (`cadence-model`).
///
/// The [`model::EquationModel`] trait is the main extension point for
/// user-defined equations.
pub use cadence_model as model;

/// Scheduler and coupled-system driver (`cadence-engine`).
///
/// [`engine::TransitionScheduler`] for single models under an external
/// kernel, [`engine::Simulator`] for validated multi-model systems.
pub use cadence_engine as engine;

/// Reference equation models (`cadence-models`).
///
/// Includes [`models::StepSource`], [`models::Accumulator`], and the
/// all-sync aggregators [`models::Sum`], [`models::WeightedProduct`],
/// [`models::Mean`].
pub use cadence_models as models;

/// Deterministic trace recording and comparison (`cadence-replay`).
///
/// Record runs with [`replay::TraceRecorder`], verify determinism with
/// [`replay::compare_traces`].
pub use cadence_replay as replay;

/// Common imports for typical Cadence usage.
///
/// ```rust
/// use cadence::prelude::*;
/// ```
///
/// This imports the most frequently used types: the equation trait and
/// context, declarations, time types, events, errors, and the engine
/// surface.
pub mod prelude {
    // Core types
    pub use cadence_core::{
        HistoryPolicy, Notification, OutputEvent, SyncMode, TimeAdvance, Timestamp, VarDef, VarId,
        VarRole, VarSet,
    };

    // Errors
    pub use cadence_core::{ComputeError, NotifyError, StepError};

    // Equation surface
    pub use cadence_model::{ComputeContext, DependencySet, EquationModel};

    // Engine
    pub use cadence_engine::{
        ConfigError, CoupledSystem, Coupling, ModelConfig, SimulationError, Simulator, StepMetrics,
        StepResult, TransitionScheduler,
    };

    // Replay
    pub use cadence_replay::{compare_traces, trace_hash, StepTrace, TraceRecorder};
}
