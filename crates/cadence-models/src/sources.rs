//! Source models: trajectories driven only by the model's own clock.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use cadence_core::{ComputeError, VarDef, VarId};
use cadence_model::{ComputeContext, EquationModel};

/// Piecewise-constant switch: `before` until the switch instant, then
/// `after`.
///
/// The standard perturbation producer for shift-semantics tests: a
/// consumer reading the output at shift −1 must see the pre-switch
/// value at the switch instant itself and the post-switch value one
/// step later.
pub struct StepSource {
    output: String,
    before: f64,
    after: f64,
    at: f64,
}

impl StepSource {
    /// `output` carries `before` for `t < at` and `after` for `t >= at`.
    pub fn new(output: impl Into<String>, before: f64, after: f64, at: f64) -> Self {
        Self {
            output: output.into(),
            before,
            after,
            at,
        }
    }
}

impl EquationModel for StepSource {
    fn name(&self) -> &str {
        "step_source"
    }

    fn variables(&self) -> Vec<VarDef> {
        vec![VarDef::owned_init(&self.output, self.before)]
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        let value = if ctx.time().value() >= self.at {
            self.after
        } else {
            self.before
        };
        ctx.set(VarId(0), value)
    }
}

/// Linear ramp: `offset + slope * t`.
pub struct RampSource {
    output: String,
    offset: f64,
    slope: f64,
}

impl RampSource {
    /// `output(t) = offset + slope * t`.
    pub fn new(output: impl Into<String>, offset: f64, slope: f64) -> Self {
        Self {
            output: output.into(),
            offset,
            slope,
        }
    }
}

impl EquationModel for RampSource {
    fn name(&self) -> &str {
        "ramp_source"
    }

    fn variables(&self) -> Vec<VarDef> {
        vec![VarDef::owned_init(&self.output, self.offset)]
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        ctx.set(VarId(0), self.offset + self.slope * ctx.time().value())
    }
}

/// Uniform noise in `[-amplitude, amplitude]` around a mean.
///
/// Respects the determinism contract: the RNG is seeded from
/// `seed XOR bits(t)` at every step, so identical seeds and identical
/// event schedules produce bit-identical trajectories.
pub struct NoiseSource {
    output: String,
    mean: f64,
    amplitude: f64,
    seed: u64,
}

impl NoiseSource {
    /// Noise around `mean` with half-range `amplitude`, seeded RNG.
    pub fn new(output: impl Into<String>, mean: f64, amplitude: f64, seed: u64) -> Self {
        Self {
            output: output.into(),
            mean,
            amplitude,
            seed,
        }
    }
}

impl EquationModel for NoiseSource {
    fn name(&self) -> &str {
        "noise_source"
    }

    fn variables(&self) -> Vec<VarDef> {
        vec![VarDef::owned_init(&self.output, self.mean)]
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ ctx.time().value().to_bits());
        let unit: f64 = rng.random();
        let value = self.mean + (unit * 2.0 - 1.0) * self.amplitude;
        ctx.set(VarId(0), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::Timestamp;
    use cadence_engine::{ModelConfig, TransitionScheduler};

    fn run_source(eq: Box<dyn EquationModel>, steps: u64) -> Vec<f64> {
        let config = ModelConfig::new("src", eq).with_time_step(1.0);
        let mut s = TransitionScheduler::new(config).unwrap();
        s.start(Timestamp::ZERO).unwrap();
        (1..=steps)
            .map(|k| {
                s.process(Timestamp(k as f64)).unwrap();
                s.value("out", 0).unwrap()
            })
            .collect()
    }

    #[test]
    fn step_source_switches_at_the_declared_instant() {
        let values = run_source(Box::new(StepSource::new("out", 0.0, 10.0, 5.0)), 7);
        assert_eq!(values, vec![0.0, 0.0, 0.0, 0.0, 10.0, 10.0, 10.0]);
    }

    #[test]
    fn ramp_source_is_linear_in_time() {
        let values = run_source(Box::new(RampSource::new("out", 1.0, 0.5)), 4);
        assert_eq!(values, vec![1.5, 2.0, 2.5, 3.0]);
    }

    #[test]
    fn noise_source_is_deterministic_per_seed() {
        let a = run_source(Box::new(NoiseSource::new("out", 0.0, 1.0, 42)), 16);
        let b = run_source(Box::new(NoiseSource::new("out", 0.0, 1.0, 42)), 16);
        assert_eq!(a, b, "same seed, same schedule: bit-identical output");

        let c = run_source(Box::new(NoiseSource::new("out", 0.0, 1.0, 7)), 16);
        assert_ne!(a, c, "different seeds should diverge");
    }

    #[test]
    fn noise_source_respects_amplitude() {
        let values = run_source(Box::new(NoiseSource::new("out", 2.0, 0.5, 1)), 32);
        assert!(values.iter().all(|v| (1.5..=2.5).contains(v)));
    }
}
