//! Reusable equation model fixtures.
//!
//! Three standard models for scheduler and simulator testing:
//!
//! - [`ConstantModel`] — recommits a constant value every step.
//! - [`EchoModel`] — copies one external input to one owned output.
//! - [`FailingModel`] — fails deterministically after N successes.

use std::sync::atomic::{AtomicUsize, Ordering};

use cadence_core::{ComputeError, SyncMode, VarDef, VarId};
use cadence_model::{ComputeContext, EquationModel};

/// Recommits a constant value to one owned variable every step.
///
/// The declared init equals the value, so downstream references are
/// seeded consistently at start.
pub struct ConstantModel {
    pub output: String,
    pub value: f64,
}

impl ConstantModel {
    pub fn new(output: impl Into<String>, value: f64) -> Self {
        Self {
            output: output.into(),
            value,
        }
    }
}

impl EquationModel for ConstantModel {
    fn name(&self) -> &str {
        "constant"
    }

    fn variables(&self) -> Vec<VarDef> {
        vec![VarDef::owned_init(&self.output, self.value)]
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        ctx.set(VarId(0), self.value)
    }
}

/// Copies one external input to one owned output: `y = x(0)`.
///
/// Useful for routing tests: if the output matches the upstream value,
/// bag application and emission are working.
pub struct EchoModel {
    pub output: String,
    pub input: String,
    pub mode: SyncMode,
}

impl EchoModel {
    pub fn new(output: impl Into<String>, input: impl Into<String>, mode: SyncMode) -> Self {
        Self {
            output: output.into(),
            input: input.into(),
            mode,
        }
    }
}

impl EquationModel for EchoModel {
    fn name(&self) -> &str {
        "echo"
    }

    fn variables(&self) -> Vec<VarDef> {
        vec![
            VarDef::owned_init(&self.output, 0.0),
            VarDef::external(&self.input, self.mode),
        ]
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        let x = ctx.value(VarId(1), 0)?;
        ctx.set(VarId(0), x)
    }
}

/// Succeeds `succeed_count` times, then fails every call.
pub struct FailingModel {
    pub output: String,
    succeed_count: usize,
    calls: AtomicUsize,
}

impl FailingModel {
    pub fn new(output: impl Into<String>, succeed_count: usize) -> Self {
        Self {
            output: output.into(),
            succeed_count,
            calls: AtomicUsize::new(0),
        }
    }
}

impl EquationModel for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    fn variables(&self) -> Vec<VarDef> {
        vec![VarDef::owned_init(&self.output, 0.0)]
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.succeed_count {
            let prev = ctx.value(VarId(0), -1)?;
            ctx.set(VarId(0), prev + 1.0)
        } else {
            Err(ComputeError::Failed {
                reason: format!("deliberate failure on call {call}"),
            })
        }
    }
}
