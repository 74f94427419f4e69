//! The [`EquationModel`] trait.

use cadence_core::{ComputeError, VarDef};

use crate::context::ComputeContext;

/// A user-supplied difference-equation model.
///
/// # Contract
///
/// - `variables()` is called once at construction and must return the
///   same declarations every time; declaration order fixes id
///   assignment, external iteration order, and output emission order.
/// - `compute()` and `init()` MUST be pure functions of the visible
///   history and the context time: same inputs, same staged outputs.
/// - `&self` — equation state lives in variables, not in the struct.
///
/// # Object safety
///
/// This trait is object-safe; the scheduler stores equations as
/// `Box<dyn EquationModel>`.
///
/// # Examples
///
/// A one-step recurrence over an async input:
///
/// ```
/// use cadence_core::{ComputeError, SyncMode, VarDef, VarId};
/// use cadence_model::{ComputeContext, EquationModel};
///
/// struct Follower;
///
/// impl EquationModel for Follower {
///     fn name(&self) -> &str { "follower" }
///
///     fn variables(&self) -> Vec<VarDef> {
///         vec![
///             VarDef::owned_init("y", 0.0),
///             VarDef::external("x", SyncMode::Async),
///         ]
///     }
///
///     fn compute(&self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
///         let y = ctx.value(VarId(0), -1)?;
///         let x = ctx.value(VarId(1), 0)?;
///         ctx.set(VarId(0), 0.5 * (y + x))
///     }
/// }
///
/// let eq = Follower;
/// assert_eq!(eq.name(), "follower");
/// assert_eq!(eq.variables().len(), 2);
/// ```
pub trait EquationModel: Send + 'static {
    /// Human-readable name for error reporting and diagnostics.
    fn name(&self) -> &str;

    /// The model's variable declarations, owned and external.
    ///
    /// Called once at construction, not per step.
    fn variables(&self) -> Vec<VarDef>;

    /// Seed owned variables before the simulation clock starts.
    ///
    /// Runs once at the start instant, after declared `init` values have
    /// been staged; writes made here overwrite them. Reading shift −1 is
    /// an `OutOfHistory` error at this point — there is no prior state.
    ///
    /// Default: keep the declared seeds.
    fn init(&self, _ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
        Ok(())
    }

    /// Evaluate the equations for one step.
    ///
    /// Called exactly once per simulated instant with all external
    /// values for that instant already applied. Writes are staged and
    /// committed only if the whole step succeeds.
    fn compute(&self, ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError>;
}
