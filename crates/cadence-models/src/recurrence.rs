//! Recurrence models combining own history with external references.

use cadence_core::{ComputeError, SyncMode, VarDef, VarId};
use cadence_model::{ComputeContext, EquationModel};

/// One-step accumulator over one external input:
/// `y = y(−1) + x(−1) + bias`.
///
/// Reads the input at shift −1, so a perturbation arriving at instant t
/// affects the accumulated value only from t+step onward.
pub struct Accumulator {
    output: String,
    input: String,
    mode: SyncMode,
    bias: f64,
    init: f64,
}

impl Accumulator {
    /// `output = output(−1) + input(−1) + bias`, seeded with `init`.
    pub fn new(
        output: impl Into<String>,
        input: impl Into<String>,
        mode: SyncMode,
        bias: f64,
        init: f64,
    ) -> Self {
        Self {
            output: output.into(),
            input: input.into(),
            mode,
            bias,
            init,
        }
    }
}

impl EquationModel for Accumulator {
    fn name(&self) -> &str {
        "accumulator"
    }

    fn variables(&self) -> Vec<VarDef> {
        vec![
            VarDef::owned_init(&self.output, self.init),
            VarDef::external(&self.input, self.mode),
        ]
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        let prev = ctx.value(VarId(0), -1)?;
        let input = ctx.value(VarId(1), -1)?;
        ctx.set(VarId(0), prev + input + self.bias)
    }
}

/// Exponential smoothing over one external input:
/// `y = alpha * x(0) + (1 − alpha) * y(−1)`.
///
/// Reads the input at shift 0 (the latest received value), which is the
/// natural shape for an Async reference: every arrival triggers a
/// smoothing step with the freshest value.
pub struct Smoother {
    output: String,
    input: String,
    mode: SyncMode,
    alpha: f64,
}

impl Smoother {
    /// `output = alpha * input(0) + (1 − alpha) * output(−1)`.
    pub fn new(output: impl Into<String>, input: impl Into<String>, mode: SyncMode, alpha: f64) -> Self {
        Self {
            output: output.into(),
            input: input.into(),
            mode,
            alpha,
        }
    }
}

impl EquationModel for Smoother {
    fn name(&self) -> &str {
        "smoother"
    }

    fn variables(&self) -> Vec<VarDef> {
        vec![
            VarDef::owned_init(&self.output, 0.0),
            VarDef::external(&self.input, self.mode),
        ]
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        let prev = ctx.value(VarId(0), -1)?;
        let input = ctx.value(VarId(1), 0)?;
        ctx.set(VarId(0), self.alpha * input + (1.0 - self.alpha) * prev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{Notification, Timestamp};
    use cadence_engine::{ModelConfig, TransitionScheduler};

    #[test]
    fn accumulator_reads_the_input_one_step_back() {
        let eq = Accumulator::new("c", "b", SyncMode::Sync, 1.0, 0.0);
        let config = ModelConfig::new("c1", Box::new(eq)).with_time_step(1.0);
        let mut s = TransitionScheduler::new(config).unwrap();
        s.start(Timestamp::ZERO).unwrap();

        // Seed b at the start instant, then feed b = t each step.
        s.notify(&Notification::scalar("b", 0.0), Timestamp::ZERO)
            .unwrap();
        let mut values = Vec::new();
        for k in 1..=4u64 {
            let t = Timestamp(k as f64);
            s.notify(&Notification::scalar("b", k as f64), t).unwrap();
            s.process(t).unwrap();
            values.push(s.value("c", 0).unwrap());
        }
        // c(t) = c(t−1) + b(t−1) + 1 with b(t) = t:
        assert_eq!(values, vec![1.0, 3.0, 6.0, 10.0]);
    }

    #[test]
    fn smoother_converges_toward_a_constant_input() {
        let eq = Smoother::new("y", "x", SyncMode::Async, 0.5);
        let config = ModelConfig::new("smooth", Box::new(eq));
        let mut s = TransitionScheduler::new(config).unwrap();
        s.start(Timestamp::ZERO).unwrap();

        let mut expected = 0.0;
        for k in 1..=10u64 {
            let t = Timestamp(k as f64);
            s.notify(&Notification::scalar("x", 8.0), t).unwrap();
            s.process(t).unwrap();
            expected = 0.5 * 8.0 + 0.5 * expected;
            assert_eq!(s.value("y", 0), Some(expected));
        }
        assert!((s.value("y", 0).unwrap() - 8.0).abs() < 0.02);
    }
}
