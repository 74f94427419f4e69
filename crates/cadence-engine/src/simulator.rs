//! Coupled-system validation and the single-threaded driver.
//!
//! [`CoupledSystem`] declares model instances and the couplings between
//! their ports; [`Simulator::new`] validates everything up front
//! (unknown ports, ownership, dimensions, sync cycles) and fixes a
//! deterministic same-instant processing order. The driver then steps
//! instant by instant, routing output events to downstream inputs at
//! the same simulated time.

use std::error::Error;
use std::fmt;

use indexmap::IndexMap;

use cadence_core::{
    Notification, NotifyError, OutputEvent, StepError, SyncMode, Timestamp, VarDef,
};

use crate::config::{ConfigError, ModelConfig};
use crate::scheduler::TransitionScheduler;

// ── Coupling / CoupledSystem ────────────────────────────────────

/// One directed connection from an owned output port to an external
/// input port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coupling {
    /// The emitting model.
    pub source_model: String,
    /// The emitting model's owned port.
    pub source_port: String,
    /// The receiving model.
    pub target_model: String,
    /// The receiving model's external port.
    pub target_port: String,
}

/// Declarative description of a multi-model system.
#[derive(Debug, Default)]
pub struct CoupledSystem {
    models: Vec<ModelConfig>,
    couplings: Vec<Coupling>,
}

impl CoupledSystem {
    /// An empty system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model instance. Registration order breaks ties in the
    /// same-instant processing order.
    pub fn model(mut self, config: ModelConfig) -> Self {
        self.models.push(config);
        self
    }

    /// Connect `source_model.source_port` to `target_model.target_port`.
    pub fn couple(
        mut self,
        source_model: &str,
        source_port: &str,
        target_model: &str,
        target_port: &str,
    ) -> Self {
        self.couplings.push(Coupling {
            source_model: source_model.to_string(),
            source_port: source_port.to_string(),
            target_model: target_model.to_string(),
            target_port: target_port.to_string(),
        });
        self
    }
}

// ── SimulationError ─────────────────────────────────────────────

/// Errors surfaced while driving a coupled system.
#[derive(Clone, Debug, PartialEq)]
pub enum SimulationError {
    /// A model's transition failed (fatal modeling error).
    Model {
        /// The failing model.
        model: String,
        /// The underlying transition error.
        source: StepError,
    },
    /// Routing an event or stimulus to a model failed.
    Delivery {
        /// The receiving model.
        model: String,
        /// The underlying delivery error.
        source: NotifyError,
    },
    /// A stimulus addressed an unregistered model.
    UnknownModel {
        /// The unknown name.
        model: String,
    },
    /// The simulator has not been started.
    NotStarted,
    /// `start` was called twice.
    AlreadyStarted,
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model { model, source } => write!(f, "model '{model}': {source}"),
            Self::Delivery { model, source } => {
                write!(f, "delivery to model '{model}': {source}")
            }
            Self::UnknownModel { model } => write!(f, "unknown model '{model}'"),
            Self::NotStarted => write!(f, "simulator not started"),
            Self::AlreadyStarted => write!(f, "simulator already started"),
        }
    }
}

impl Error for SimulationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Model { source, .. } => Some(source),
            Self::Delivery { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ── Instant results ─────────────────────────────────────────────

/// One output event attributed to its emitting model.
#[derive(Clone, Debug, PartialEq)]
pub struct Emission {
    /// The emitting model.
    pub model: String,
    /// The emitted event.
    pub event: OutputEvent,
}

/// Everything emitted during one processed instant, in processing
/// order.
#[derive(Clone, Debug, PartialEq)]
pub struct InstantOutputs {
    /// The processed instant.
    pub time: Timestamp,
    /// Emissions in deterministic processing order.
    pub emissions: Vec<Emission>,
}

// ── Simulator ───────────────────────────────────────────────────

/// A routed output target.
#[derive(Clone, Debug)]
struct Route {
    source_port: String,
    target: usize,
    target_port: String,
}

/// An injected external stimulus awaiting delivery.
#[derive(Clone, Debug)]
struct Stimulus {
    time: Timestamp,
    seq: u64,
    model: usize,
    notification: Notification,
}

/// Single-threaded driver for a validated coupled system.
///
/// One instant is processed at a time; within an instant, models run in
/// the precomputed topological order (Sync/Async couplings point
/// downstream, registration order breaks ties), so producers always
/// commit and emit before their same-instant consumers recompute.
pub struct Simulator {
    schedulers: Vec<TransitionScheduler>,
    model_names: Vec<String>,
    index: IndexMap<String, usize>,
    routes: Vec<Vec<Route>>,
    order: Vec<usize>,
    pending: Vec<Stimulus>,
    next_seq: u64,
    started: bool,
}

impl Simulator {
    /// Validate a [`CoupledSystem`] and build its schedulers.
    ///
    /// Detects duplicate/unknown model names, unknown or misclassified
    /// coupling ports, dimension mismatches, and Sync coupling cycles.
    /// Aggregator models with `all_sync` get one Sync external
    /// auto-declared per connected input port.
    pub fn new(system: CoupledSystem) -> Result<Self, ConfigError> {
        let CoupledSystem { models, couplings } = system;
        let n = models.len();

        // 1. Index model names.
        let mut index: IndexMap<String, usize> = IndexMap::new();
        for (i, config) in models.iter().enumerate() {
            if index.insert(config.name.clone(), i).is_some() {
                return Err(ConfigError::DuplicateModel {
                    model: config.name.clone(),
                });
            }
        }

        // 2. Snapshot declarations for coupling validation.
        let declared: Vec<Vec<VarDef>> = models.iter().map(|m| m.equation.variables()).collect();
        let mut discovered: Vec<Vec<VarDef>> = vec![Vec::new(); n];

        // 3. Validate couplings, build routes and the edge table.
        let mut routes: Vec<Vec<Route>> = vec![Vec::new(); n];
        let mut edges: IndexMap<(usize, usize), bool> = IndexMap::new();
        for c in &couplings {
            let src = *index
                .get(&c.source_model)
                .ok_or_else(|| ConfigError::UnknownModel {
                    model: c.source_model.clone(),
                })?;
            let dst = *index
                .get(&c.target_model)
                .ok_or_else(|| ConfigError::UnknownModel {
                    model: c.target_model.clone(),
                })?;

            let source_def = declared[src]
                .iter()
                .find(|d| d.name == c.source_port)
                .ok_or_else(|| ConfigError::UnknownDependency {
                    model: c.source_model.clone(),
                    port: c.source_port.clone(),
                })?;
            if !source_def.is_owned() {
                return Err(ConfigError::SourceNotOwned {
                    model: c.source_model.clone(),
                    port: c.source_port.clone(),
                });
            }

            let target_decl = declared[dst]
                .iter()
                .chain(&discovered[dst])
                .find(|d| d.name == c.target_port)
                .cloned();
            let (mode, target_dim) = match target_decl {
                Some(d) if d.is_owned() => {
                    return Err(ConfigError::TargetNotExternal {
                        model: c.target_model.clone(),
                        port: c.target_port.clone(),
                    })
                }
                Some(d) => {
                    let declared_mode = d.mode().expect("external declaration has a mode");
                    let mode = if models[dst].all_sync {
                        SyncMode::Sync
                    } else {
                        declared_mode
                    };
                    (mode, d.dimension)
                }
                None if models[dst].all_sync => {
                    // Auto-discover: one Sync external per connected input.
                    let def = VarDef::external(&c.target_port, SyncMode::Sync)
                        .with_dimension(source_def.dimension);
                    discovered[dst].push(def);
                    (SyncMode::Sync, source_def.dimension)
                }
                None => {
                    return Err(ConfigError::UnknownDependency {
                        model: c.target_model.clone(),
                        port: c.target_port.clone(),
                    })
                }
            };
            if target_dim != source_def.dimension {
                return Err(ConfigError::DimensionMismatch {
                    source_model: c.source_model.clone(),
                    source_port: c.source_port.clone(),
                    target_model: c.target_model.clone(),
                    target_port: c.target_port.clone(),
                });
            }
            if src == dst && mode == SyncMode::Sync {
                return Err(ConfigError::DependencyCycle {
                    models: vec![c.source_model.clone()],
                });
            }

            routes[src].push(Route {
                source_port: c.source_port.clone(),
                target: dst,
                target_port: c.target_port.clone(),
            });
            let sync_edge = edges.entry((src, dst)).or_insert(false);
            *sync_edge |= mode == SyncMode::Sync;
        }

        // 4. Fix the same-instant processing order: topological over
        //    the coupling graph, registration order breaking ties; a
        //    cycle is broken at a non-Sync edge or rejected.
        let order = Self::compute_processing_order(n, &edges, &models)?;

        // 5. Build the schedulers with their discovered externals.
        let model_names: Vec<String> = models.iter().map(|m| m.name.clone()).collect();
        let mut schedulers = Vec::with_capacity(n);
        for (config, extra) in models.into_iter().zip(&discovered) {
            schedulers.push(TransitionScheduler::with_discovered(config, extra)?);
        }

        Ok(Self {
            schedulers,
            model_names,
            index,
            routes,
            order,
            pending: Vec::new(),
            next_seq: 0,
            started: false,
        })
    }

    fn compute_processing_order(
        n: usize,
        edges: &IndexMap<(usize, usize), bool>,
        models: &[ModelConfig],
    ) -> Result<Vec<usize>, ConfigError> {
        let mut remaining = vec![true; n];
        let mut order = Vec::with_capacity(n);
        for _ in 0..n {
            let unresolved = |i: usize, sync_only: bool| {
                edges.iter().any(|(&(s, t), &sync)| {
                    t == i && s != i && remaining[s] && (!sync_only || sync)
                })
            };
            // Prefer a node with no unresolved inputs at all; otherwise
            // break the cycle at a node whose unresolved inputs are all
            // non-Sync.
            let pick = (0..n)
                .filter(|&i| remaining[i])
                .find(|&i| !unresolved(i, false))
                .or_else(|| {
                    (0..n)
                        .filter(|&i| remaining[i])
                        .find(|&i| !unresolved(i, true))
                });
            match pick {
                Some(i) => {
                    remaining[i] = false;
                    order.push(i);
                }
                None => {
                    let models = (0..n)
                        .filter(|&i| remaining[i])
                        .map(|i| models[i].name.clone())
                        .collect();
                    return Err(ConfigError::DependencyCycle { models });
                }
            }
        }
        Ok(order)
    }

    /// Start every model at `t0` and run the initialization exchange:
    /// each model's seed values are routed to its downstream references
    /// before any model computes.
    pub fn start(&mut self, t0: Timestamp) -> Result<(), SimulationError> {
        if self.started {
            return Err(SimulationError::AlreadyStarted);
        }
        let order = self.order.clone();
        for &i in &order {
            self.schedulers[i]
                .start(t0)
                .map_err(|source| SimulationError::Model {
                    model: self.model_names[i].clone(),
                    source,
                })?;
        }
        for &i in &order {
            let outputs = self.schedulers[i].output().to_vec();
            self.route(i, &outputs, t0)?;
        }
        self.started = true;
        Ok(())
    }

    /// Inject an external stimulus for delivery at `time`.
    ///
    /// Stimuli for one instant are delivered in posting order before
    /// that instant is processed.
    pub fn post(
        &mut self,
        model: &str,
        notification: Notification,
        time: Timestamp,
    ) -> Result<(), SimulationError> {
        let idx = *self
            .index
            .get(model)
            .ok_or_else(|| SimulationError::UnknownModel {
                model: model.to_string(),
            })?;
        self.pending.push(Stimulus {
            time,
            seq: self.next_seq,
            model: idx,
            notification,
        });
        self.next_seq += 1;
        Ok(())
    }

    /// The next instant at which anything has work, if any.
    pub fn next_event_time(&self) -> Option<Timestamp> {
        let scheduled = self
            .schedulers
            .iter()
            .filter_map(TransitionScheduler::next_event_time)
            .min();
        let posted = self.pending.iter().map(|s| s.time).min();
        match (scheduled, posted) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Process the next instant.
    ///
    /// Delivers due stimuli, then runs every model with an event at
    /// that instant in the fixed processing order, routing outputs as
    /// they are committed. Models triggered mid-instant by a routed
    /// event (an Async consumer with no clock of its own) are swept up
    /// in the same instant; each model still computes at most once.
    ///
    /// Returns `None` when nothing is scheduled anywhere.
    pub fn step(&mut self) -> Result<Option<InstantOutputs>, SimulationError> {
        if !self.started {
            return Err(SimulationError::NotStarted);
        }
        let Some(t) = self.next_event_time() else {
            return Ok(None);
        };

        // 1. Deliver stimuli due at t, in posting order.
        let mut due: Vec<Stimulus> = Vec::new();
        self.pending.retain(|s| {
            if s.time == t {
                due.push(s.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|s| s.seq);
        for s in due {
            self.schedulers[s.model]
                .notify(&s.notification, t)
                .map_err(|source| SimulationError::Delivery {
                    model: self.model_names[s.model].clone(),
                    source,
                })?;
        }

        // 2. Process every model due at t, sweeping until no routed
        //    event leaves further same-instant work.
        let order = self.order.clone();
        let mut processed = vec![false; self.schedulers.len()];
        let mut emissions = Vec::new();
        loop {
            let mut progressed = false;
            for &i in &order {
                if processed[i] || self.schedulers[i].next_event_time() != Some(t) {
                    continue;
                }
                let result =
                    self.schedulers[i]
                        .process(t)
                        .map_err(|source| SimulationError::Model {
                            model: self.model_names[i].clone(),
                            source,
                        })?;
                processed[i] = true;
                progressed = true;
                self.route(i, &result.outputs, t)?;
                let model = self.model_names[i].clone();
                emissions.extend(result.outputs.into_iter().map(|event| Emission {
                    model: model.clone(),
                    event,
                }));
            }
            if !progressed {
                break;
            }
        }

        Ok(Some(InstantOutputs { time: t, emissions }))
    }

    /// Process instants until none remain at or before `t_end`.
    ///
    /// Returns the number of instants processed.
    pub fn run_until(&mut self, t_end: Timestamp) -> Result<u64, SimulationError> {
        if !self.started {
            return Err(SimulationError::NotStarted);
        }
        let mut instants = 0;
        while let Some(t) = self.next_event_time() {
            if t > t_end {
                break;
            }
            self.step()?;
            instants += 1;
        }
        Ok(instants)
    }

    /// Route one model's outputs to its coupled targets at `t`.
    fn route(
        &mut self,
        source: usize,
        outputs: &[OutputEvent],
        t: Timestamp,
    ) -> Result<(), SimulationError> {
        for ev in outputs {
            for r in &self.routes[source] {
                if r.source_port != ev.port {
                    continue;
                }
                let notification = Notification {
                    port: r.target_port.clone(),
                    element: ev.element,
                    value: ev.value,
                };
                self.schedulers[r.target]
                    .notify(&notification, t)
                    .map_err(|source| SimulationError::Delivery {
                        model: self.model_names[r.target].clone(),
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// Committed value of a model's scalar at a non-positive shift.
    pub fn value(&self, model: &str, var: &str, shift: i32) -> Option<f64> {
        let idx = *self.index.get(model)?;
        self.schedulers[idx].value(var, shift)
    }

    /// Access one model's scheduler for observation.
    pub fn scheduler(&self, model: &str) -> Option<&TransitionScheduler> {
        let idx = *self.index.get(model)?;
        Some(&self.schedulers[idx])
    }

    /// Model names in the fixed same-instant processing order.
    pub fn processing_order(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|&i| self.model_names[i].as_str())
    }

    /// Number of registered models.
    pub fn model_count(&self) -> usize {
        self.schedulers.len()
    }
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("models", &self.model_names)
            .field("started", &self.started)
            .field("pending", &self.pending.len())
            .finish()
    }
}
