//! The transition scheduler: one model's DEVS cycle.
//!
//! [`TransitionScheduler`] owns a model's variables, merges same-instant
//! notifications into a [`Bag`], and drives the
//! internal/external/confluent transition cycle with exactly one
//! `compute` per simulated instant. On equation failure the staged
//! writes are abandoned, so a failed step leaves history untouched.

use std::time::Instant;

use indexmap::IndexMap;

use cadence_core::{
    ComputeError, Notification, NotifyError, OutputEvent, StepError, SyncMode, TimeAdvance,
    Timestamp, VarDef,
};
use cadence_history::VarArena;
use cadence_model::{ComputeContext, DependencySet, EquationModel};

use crate::bag::Bag;
use crate::config::{ConfigError, ModelConfig};
use crate::emitter::OutputEmitter;
use crate::metrics::StepMetrics;

// ── Phase ───────────────────────────────────────────────────────

/// The scheduler's state-machine phase.
///
/// `Computing` and `Emitting` are transient within
/// [`process()`](TransitionScheduler::process); between calls the
/// scheduler is either `Idle` or `Collecting`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the next scheduled recompute or arrival.
    Idle,
    /// A bag is open, accumulating notifications for one instant.
    Collecting,
    /// Equations are evaluating.
    Computing,
    /// Output events are being built.
    Emitting,
}

// ── Notified ────────────────────────────────────────────────────

/// How a notification was absorbed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notified {
    /// Recorded directly in the variable's history without opening a
    /// bag: Nosync arrivals, start-instant seed values, and arrivals at
    /// an instant the model has already computed.
    Applied,
    /// Merged into the bag for its instant; the scheduler's time
    /// advance now reports that instant as due.
    Collected,
}

// ── StepResult ──────────────────────────────────────────────────

/// Result of a successful transition.
#[derive(Debug)]
pub struct StepResult {
    /// Output events committed by this transition, declaration order.
    pub outputs: Vec<OutputEvent>,
    /// Timing and delivery metrics for this transition.
    pub metrics: StepMetrics,
}

// ── TransitionScheduler ─────────────────────────────────────────

/// Single-model transition scheduler.
///
/// Owns all of the model's state and executes transitions
/// synchronously. The surrounding kernel (or [`Simulator`]) queries
/// [`time_advance()`](Self::time_advance), delivers notifications with
/// [`notify()`](Self::notify), and grants processing with
/// [`process()`](Self::process).
///
/// [`Simulator`]: crate::Simulator
pub struct TransitionScheduler {
    name: String,
    equation: Box<dyn EquationModel>,
    arena: VarArena,
    deps: DependencySet,
    emitter: OutputEmitter,
    time_step: Option<f64>,
    origin: Timestamp,
    steps: u64,
    current_time: Timestamp,
    phase: Phase,
    bag: Option<Bag>,
    started: bool,
    received: IndexMap<String, u64>,
    last_outputs: Vec<OutputEvent>,
    last_metrics: StepMetrics,
}

impl TransitionScheduler {
    /// Construct a scheduler from a [`ModelConfig`].
    ///
    /// Declares the equation's variables in order, builds the
    /// dependency classification and output port table, and validates
    /// the internal clock. Consumes the config.
    pub fn new(config: ModelConfig) -> Result<Self, ConfigError> {
        Self::with_discovered(config, &[])
    }

    /// Construct with extra auto-discovered external declarations.
    ///
    /// Used by coupled-system validation: aggregators that opted into
    /// `all_sync` get one Sync external per connected input, appended
    /// after the equation's own declarations.
    pub(crate) fn with_discovered(
        config: ModelConfig,
        discovered: &[VarDef],
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let ModelConfig {
            name,
            equation,
            time_step,
            all_sync,
        } = config;

        let declared = equation.variables();
        if declared.is_empty() && discovered.is_empty() {
            return Err(ConfigError::NoVariables { model: name });
        }

        let mut arena = VarArena::new();
        let mut deps = DependencySet::new(all_sync);
        for def in declared.iter().chain(discovered) {
            let base = arena.declare(def).map_err(|source| ConfigError::History {
                model: name.clone(),
                source,
            })?;
            deps.insert(def, base);
        }
        let emitter = OutputEmitter::from_deps(&deps);

        Ok(Self {
            name,
            equation,
            arena,
            deps,
            emitter,
            time_step,
            origin: Timestamp::ZERO,
            steps: 0,
            current_time: Timestamp::ZERO,
            phase: Phase::Idle,
            bag: None,
            started: false,
            received: IndexMap::new(),
            last_outputs: Vec::new(),
            last_metrics: StepMetrics::default(),
        })
    }

    /// Seed owned variables and start the clock at `t0`.
    ///
    /// Declared `init` values are staged first, then the equation's
    /// `init` hook may overwrite them; everything is committed at `t0`
    /// and emitted so downstream references receive their seeds. The
    /// first internal recompute is scheduled at `t0 + step`.
    pub fn start(&mut self, t0: Timestamp) -> Result<(), StepError> {
        if self.started {
            return Err(StepError::AlreadyStarted);
        }

        // 1. Stage declared seeds (default 0.0).
        {
            let (_, staged) = self.arena.split();
            for decl in self.deps.owned() {
                for e in 0..decl.dimension {
                    use cadence_core::StageWriter as _;
                    staged.stage(decl.var.element(e), decl.init.unwrap_or(0.0));
                }
            }
        }

        // 2. Run the init hook; it sees the staged seeds at shift 0 and
        //    no committed history.
        {
            let (store, staged) = self.arena.split();
            let mut ctx = ComputeContext::new(store, staged, &self.deps, t0);
            if let Err(reason) = self.equation.init(&mut ctx) {
                self.arena.discard();
                return Err(StepError::EquationFailed {
                    model: self.name.clone(),
                    time: t0,
                    reason,
                });
            }
        }

        // 3. Reject non-finite seeds, then commit and emit.
        self.reject_non_finite(t0)?;
        let changed = self.arena.commit(t0);
        self.last_outputs = self.emitter.collect(self.arena.store(), &changed, t0);

        self.origin = t0;
        self.current_time = t0;
        self.steps = 0;
        self.started = true;
        self.phase = Phase::Idle;
        Ok(())
    }

    /// The instant of the next internally scheduled recompute.
    ///
    /// Computed as `t0 + k·step` from the step counter, not by repeated
    /// addition, so long trajectories stay bit-stable.
    fn next_internal(&self) -> Option<Timestamp> {
        self.time_step
            .map(|step| Timestamp(self.origin.0 + (self.steps + 1) as f64 * step))
    }

    /// The next instant at which this model has work, if any.
    pub fn next_event_time(&self) -> Option<Timestamp> {
        if !self.started {
            return None;
        }
        let internal = self.next_internal();
        let external = self.bag.as_ref().map(Bag::time);
        match (internal, external) {
            (Some(i), Some(e)) => Some(i.min(e)),
            (Some(i), None) => Some(i),
            (None, Some(e)) => Some(e),
            (None, None) => None,
        }
    }

    /// Delay from the last transition to the next event.
    ///
    /// While `Idle` this depends only on the internal clock; an open
    /// bag collapses it to the bag's instant.
    pub fn time_advance(&self) -> TimeAdvance {
        match self.next_event_time() {
            Some(t) => TimeAdvance::Finite(t.since(self.current_time)),
            None => TimeAdvance::Infinity,
        }
    }

    /// Deliver one external notification at `time`.
    ///
    /// Nosync arrivals, start-instant seeds, and arrivals at an instant
    /// the model has already computed are recorded directly
    /// ([`Notified::Applied`]). Sync/Async arrivals for a later instant
    /// open or join the bag for that instant ([`Notified::Collected`]);
    /// repeated deliveries for the same element within a bag keep the
    /// last value and an observable count.
    pub fn notify(
        &mut self,
        notification: &Notification,
        time: Timestamp,
    ) -> Result<Notified, NotifyError> {
        if !self.started {
            return Err(NotifyError::NotStarted);
        }
        let decl = match self.deps.external(&notification.port) {
            Some(d) => d,
            None if self.deps.is_owned(&notification.port) => {
                return Err(NotifyError::OwnedPort {
                    port: notification.port.clone(),
                })
            }
            None => {
                return Err(NotifyError::UnknownPort {
                    port: notification.port.clone(),
                })
            }
        };
        let element = notification.element.unwrap_or(0);
        if element >= decl.dimension {
            return Err(NotifyError::ElementOutOfRange {
                port: notification.port.clone(),
                element,
                dimension: decl.dimension,
            });
        }
        if time < self.current_time {
            return Err(NotifyError::TimeRegression {
                last: self.current_time,
                time,
            });
        }

        let var = decl.var.element(element);
        let mode = decl.mode;

        // Nosync observes without triggering. Same-instant arrivals are
        // seed values at start or post-compute back-edge values; either
        // way they land in history and become visible to the next
        // recomputation.
        if mode == SyncMode::Nosync || time == self.current_time {
            self.arena
                .apply(var, notification.value, time)
                .expect("declared id");
            self.record_delivery(&notification.port);
            return Ok(Notified::Applied);
        }

        match &mut self.bag {
            None => {
                let mut bag = Bag::new(time);
                bag.merge(var, notification.value);
                self.bag = Some(bag);
                self.phase = Phase::Collecting;
            }
            Some(bag) if bag.time() == time => bag.merge(var, notification.value),
            Some(bag) => {
                return Err(NotifyError::BagOpen {
                    open_at: bag.time(),
                    time,
                })
            }
        }
        self.record_delivery(&notification.port);
        Ok(Notified::Collected)
    }

    fn record_delivery(&mut self, port: &str) {
        *self.received.entry(port.to_string()).or_insert(0) += 1;
    }

    /// Execute the transition due at `t`.
    ///
    /// Covers internal, external, and confluent transitions uniformly:
    /// bag values are applied first (external writes land before
    /// `compute`), Sync references are checked for a value at exactly
    /// `t`, the equation runs exactly once, staged writes are committed,
    /// and output events are emitted in declaration order.
    pub fn process(&mut self, t: Timestamp) -> Result<StepResult, StepError> {
        if !self.started {
            return Err(StepError::NotStarted);
        }
        let expected = self.next_event_time();
        if expected != Some(t) {
            return Err(StepError::SpuriousTransition {
                requested: t,
                expected,
            });
        }
        let step_start = Instant::now();
        let mut metrics = StepMetrics::default();

        // 1. Close and apply the bag if it is due at t (confluent case
        //    included: externals land before compute).
        let apply_start = Instant::now();
        if self.bag.as_ref().map(Bag::time) == Some(t) {
            let bag = self.bag.take().expect("bag presence checked");
            for (var, entry) in bag.entries() {
                self.arena.apply(var, entry.value, t).expect("bag ids are declared");
                let label = self
                    .deps
                    .label_of(var)
                    .unwrap_or_else(|| format!("#{var}"));
                metrics.deliveries.push((label, entry.count));
            }
            metrics.duplicate_deliveries = bag.duplicate_deliveries();
        }
        metrics.apply_us = apply_start.elapsed().as_micros() as u64;

        // 2. Every Sync reference must have a value for exactly t.
        for decl in self.deps.sync_externals() {
            for e in 0..decl.dimension {
                let var = decl.var.element(e);
                if self.arena.last_update(var) != Some(t) {
                    let port = self
                        .deps
                        .label_of(var)
                        .unwrap_or_else(|| decl.name.clone());
                    return Err(StepError::MissingSyncInput {
                        model: self.name.clone(),
                        port,
                        time: t,
                    });
                }
            }
        }

        // 3. Evaluate the equation once, against staged writes.
        self.phase = Phase::Computing;
        let compute_start = Instant::now();
        {
            let (store, staged) = self.arena.split();
            let mut ctx = ComputeContext::new(store, staged, &self.deps, t);
            if let Err(reason) = self.equation.compute(&mut ctx) {
                // Staged writes are abandoned: the step has no effect.
                self.arena.discard();
                self.phase = Phase::Idle;
                return Err(StepError::EquationFailed {
                    model: self.name.clone(),
                    time: t,
                    reason,
                });
            }
        }
        metrics.compute_us = compute_start.elapsed().as_micros() as u64;

        // 4. Sentinel check, then commit.
        self.reject_non_finite(t)?;
        let changed = self.arena.commit(t);

        // 5. Emit in declaration order.
        self.phase = Phase::Emitting;
        let emit_start = Instant::now();
        let outputs = self.emitter.collect(self.arena.store(), &changed, t);
        metrics.emit_us = emit_start.elapsed().as_micros() as u64;
        metrics.emitted_events = outputs.len() as u32;

        // 6. Reschedule and return to Idle.
        if self.next_internal() == Some(t) {
            self.steps += 1;
        }
        self.current_time = t;
        self.phase = Phase::Idle;
        metrics.total_us = step_start.elapsed().as_micros() as u64;

        self.last_outputs = outputs.clone();
        self.last_metrics = metrics.clone();
        Ok(StepResult { outputs, metrics })
    }

    /// Fail the step if any staged value is NaN or infinite.
    fn reject_non_finite(&mut self, t: Timestamp) -> Result<(), StepError> {
        let bad = self
            .arena
            .staged_entries()
            .find(|(_, v)| !v.is_finite())
            .map(|(var, _)| var);
        if let Some(var) = bad {
            let label = self
                .deps
                .label_of(var)
                .unwrap_or_else(|| format!("#{var}"));
            self.arena.discard();
            self.phase = Phase::Idle;
            return Err(StepError::EquationFailed {
                model: self.name.clone(),
                time: t,
                reason: ComputeError::NonFinite { var: label },
            });
        }
        Ok(())
    }

    /// Output events from the most recent transition (or from `start`).
    pub fn output(&self) -> &[OutputEvent] {
        &self.last_outputs
    }

    /// Metrics from the most recent transition.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// The model instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `start` has run.
    pub fn started(&self) -> bool {
        self.started
    }

    /// The current state-machine phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The instant of the last transition (or start).
    pub fn current_time(&self) -> Timestamp {
        self.current_time
    }

    /// The configured internal step, if any.
    pub fn time_step(&self) -> Option<f64> {
        self.time_step
    }

    /// The model's port classification.
    pub fn dependencies(&self) -> &DependencySet {
        &self.deps
    }

    /// Committed value of a declared scalar at a non-positive shift.
    ///
    /// Observation surface for drivers and tests; shift 0 is the latest
    /// committed value.
    pub fn value(&self, name: &str, shift: i32) -> Option<f64> {
        let (base, _) = self.arena.resolve(name)?;
        self.arena.read(base, shift)
    }

    /// Committed value of one element of a declared vector.
    pub fn element_value(&self, name: &str, element: u32, shift: i32) -> Option<f64> {
        let (base, def) = self.arena.resolve(name)?;
        if element >= def.dimension {
            return None;
        }
        self.arena.read(base.element(element), shift)
    }

    /// Cumulative notifications accepted on a port since construction.
    pub fn delivery_count(&self, port: &str) -> u64 {
        self.received.get(port).copied().unwrap_or(0)
    }
}

impl std::fmt::Debug for TransitionScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionScheduler")
            .field("name", &self.name)
            .field("current_time", &self.current_time)
            .field("phase", &self.phase)
            .field("started", &self.started)
            .finish()
    }
}
