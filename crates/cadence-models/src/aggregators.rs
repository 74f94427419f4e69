//! Generic aggregators over auto-discovered inputs.
//!
//! These models declare only their output; their inputs are discovered
//! at coupling time, one Sync external per connected port (`all_sync`
//! configuration). Every compute therefore sees a value for each input
//! at exactly the current instant, and iterates them in declaration
//! order through `DependencySet::externals()`.

use cadence_core::{ComputeError, VarDef, VarId};
use cadence_model::{ComputeContext, EquationModel};

/// Sums every connected input: `out = Σ xᵢ(0)`.
pub struct Sum {
    output: String,
}

impl Sum {
    /// Sum over all inputs connected at coupling time.
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

impl EquationModel for Sum {
    fn name(&self) -> &str {
        "sum"
    }

    fn variables(&self) -> Vec<VarDef> {
        vec![VarDef::owned_init(&self.output, 0.0)]
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        let inputs = collect_inputs(ctx);
        let mut total = 0.0;
        for var in inputs {
            total += ctx.value(var, 0)?;
        }
        ctx.set(VarId(0), total)
    }
}

/// Multiplies every connected input, each scaled by a per-port weight:
/// `out = Π wᵢ · xᵢ(0)`.
pub struct WeightedProduct {
    output: String,
    weights: Vec<(String, f64)>,
}

impl WeightedProduct {
    /// Product over all connected inputs. Ports without an entry in
    /// `weights` use weight 1.0.
    pub fn new(output: impl Into<String>, weights: Vec<(String, f64)>) -> Self {
        Self {
            output: output.into(),
            weights,
        }
    }

    fn weight(&self, port: &str) -> f64 {
        self.weights
            .iter()
            .find(|(name, _)| name == port)
            .map_or(1.0, |(_, w)| *w)
    }
}

impl EquationModel for WeightedProduct {
    fn name(&self) -> &str {
        "weighted_product"
    }

    fn variables(&self) -> Vec<VarDef> {
        vec![VarDef::owned_init(&self.output, 0.0)]
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        let inputs: Vec<(String, VarId)> = ctx
            .dependencies()
            .externals()
            .map(|d| (d.name.clone(), d.var))
            .collect();
        let mut product = 1.0;
        for (port, var) in inputs {
            product *= self.weight(&port) * ctx.value(var, 0)?;
        }
        ctx.set(VarId(0), product)
    }
}

/// Averages every connected input: `out = Σ xᵢ(0) / k`.
pub struct Mean {
    output: String,
}

impl Mean {
    /// Mean over all inputs connected at coupling time.
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

impl EquationModel for Mean {
    fn name(&self) -> &str {
        "mean"
    }

    fn variables(&self) -> Vec<VarDef> {
        vec![VarDef::owned_init(&self.output, 0.0)]
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        let inputs = collect_inputs(ctx);
        if inputs.is_empty() {
            return Err(ComputeError::Failed {
                reason: "mean over zero connected inputs".into(),
            });
        }
        let count = inputs.len() as f64;
        let mut total = 0.0;
        for var in inputs {
            total += ctx.value(var, 0)?;
        }
        ctx.set(VarId(0), total / count)
    }
}

/// Every external element id, in declaration order.
fn collect_inputs(ctx: &ComputeContext<'_>) -> Vec<VarId> {
    ctx.dependencies()
        .externals()
        .flat_map(|d| (0..d.dimension).map(move |e| d.var.element(e)))
        .collect()
}
