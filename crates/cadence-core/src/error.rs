//! Error types for the Cadence synchronization engine.
//!
//! Organized by subsystem: equation evaluation ([`ComputeError`]),
//! notification delivery ([`NotifyError`]), and transition execution
//! ([`StepError`]). All of these are invariant violations, not transient
//! faults; none are retried, and each carries the identity needed to
//! diagnose the offending model, variable, and simulated time.

use std::error::Error;
use std::fmt;

use crate::time::Timestamp;

/// Errors raised while an equation's `compute` or `init` is evaluating.
///
/// Wrapped in [`StepError::EquationFailed`] by the scheduler; the step's
/// staged writes are discarded, so a failed evaluation leaves history
/// untouched.
#[derive(Clone, Debug, PartialEq)]
pub enum ComputeError {
    /// A read addressed a shift deeper than the retained window.
    OutOfHistory {
        /// The variable that was read.
        var: String,
        /// The requested (non-positive) shift.
        shift: i32,
        /// Entries actually retained for the variable.
        depth: usize,
    },
    /// A read or write addressed a name the model never declared.
    UnknownVariable {
        /// The undeclared name.
        var: String,
    },
    /// A write addressed an external reference.
    ReadOnly {
        /// The external variable's name.
        var: String,
    },
    /// An element access at or beyond the declared dimension.
    ElementOutOfRange {
        /// The addressed variable's name.
        var: String,
        /// The offending element index.
        element: u32,
        /// The declared dimension.
        dimension: u32,
    },
    /// An owned variable was read at shift 0 before being written in
    /// the current step.
    UnsetCurrentValue {
        /// The owned variable's name.
        var: String,
    },
    /// A staged value was NaN or infinite (sentinel checking).
    NonFinite {
        /// The variable carrying the non-finite value.
        var: String,
    },
    /// The equation itself failed.
    Failed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

impl fmt::Display for ComputeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfHistory { var, shift, depth } => {
                write!(f, "'{var}' has no value at shift {shift} (depth {depth})")
            }
            Self::UnknownVariable { var } => write!(f, "unknown variable '{var}'"),
            Self::ReadOnly { var } => write!(f, "external variable '{var}' is read-only"),
            Self::ElementOutOfRange {
                var,
                element,
                dimension,
            } => write!(
                f,
                "element {element} out of range for '{var}' (dimension {dimension})"
            ),
            Self::UnsetCurrentValue { var } => {
                write!(f, "'{var}' read at shift 0 before being written this step")
            }
            Self::NonFinite { var } => write!(f, "non-finite value staged for '{var}'"),
            Self::Failed { reason } => write!(f, "equation failed: {reason}"),
        }
    }
}

impl Error for ComputeError {}

/// Errors from delivering an external notification to a model.
#[derive(Clone, Debug, PartialEq)]
pub enum NotifyError {
    /// The target port was never declared.
    UnknownPort {
        /// The undeclared port name.
        port: String,
    },
    /// The target port names an owned variable; only external
    /// references accept notifications.
    OwnedPort {
        /// The owned variable's name.
        port: String,
    },
    /// The addressed element exceeds the reference's declared dimension.
    ElementOutOfRange {
        /// The target port.
        port: String,
        /// The addressed element.
        element: u32,
        /// The declared dimension.
        dimension: u32,
    },
    /// The model has not been started.
    NotStarted,
    /// The notification is timestamped before the model's last
    /// transition.
    TimeRegression {
        /// Time of the last transition.
        last: Timestamp,
        /// The offending notification time.
        time: Timestamp,
    },
    /// A bag is open for a different instant; it must be processed
    /// before notifications for a later instant can be accepted.
    BagOpen {
        /// The instant the open bag collects for.
        open_at: Timestamp,
        /// The offending notification time.
        time: Timestamp,
    },
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPort { port } => write!(f, "unknown port '{port}'"),
            Self::OwnedPort { port } => write!(f, "port '{port}' is owned, not external"),
            Self::ElementOutOfRange {
                port,
                element,
                dimension,
            } => write!(
                f,
                "element {element} out of range for '{port}' (dimension {dimension})"
            ),
            Self::NotStarted => write!(f, "model not started"),
            Self::TimeRegression { last, time } => {
                write!(f, "notification at {time} precedes last transition at {last}")
            }
            Self::BagOpen { open_at, time } => {
                write!(f, "bag open for {open_at}, cannot collect for {time}")
            }
        }
    }
}

impl Error for NotifyError {}

/// Errors from executing a transition.
///
/// All variants are fatal for the model instance: the simulation run
/// must surface them to its driver rather than continue with a model
/// whose dependency contract is broken.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// The equation returned an error during `compute` or `init`.
    EquationFailed {
        /// Name of the failing model.
        model: String,
        /// The instant at which evaluation failed.
        time: Timestamp,
        /// The underlying evaluation error.
        reason: ComputeError,
    },
    /// A Sync reference had no value for the transition instant.
    MissingSyncInput {
        /// Name of the waiting model.
        model: String,
        /// The unsatisfied Sync port.
        port: String,
        /// The instant at which recomputation was due.
        time: Timestamp,
    },
    /// A transition was requested at an instant the scheduler has no
    /// event for.
    SpuriousTransition {
        /// The requested instant.
        requested: Timestamp,
        /// The instant the scheduler actually expects next, if any.
        expected: Option<Timestamp>,
    },
    /// The model has not been started.
    NotStarted,
    /// `start` was called twice.
    AlreadyStarted,
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EquationFailed {
                model,
                time,
                reason,
            } => write!(f, "model '{model}' failed at {time}: {reason}"),
            Self::MissingSyncInput { model, port, time } => write!(
                f,
                "model '{model}' has no value for sync input '{port}' at {time}"
            ),
            Self::SpuriousTransition {
                requested,
                expected,
            } => match expected {
                Some(e) => write!(f, "transition at {requested} but next event is at {e}"),
                None => write!(f, "transition at {requested} but no event is scheduled"),
            },
            Self::NotStarted => write!(f, "model not started"),
            Self::AlreadyStarted => write!(f, "model already started"),
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EquationFailed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
