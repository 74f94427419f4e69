//! Model configuration, validation, and engine error types.
//!
//! [`ModelConfig`] is the builder-input for constructing a
//! [`TransitionScheduler`](crate::TransitionScheduler); validation
//! happens up front so dependency mistakes surface at construction,
//! not mid-run.

use std::error::Error;
use std::fmt;

use cadence_history::HistoryError;
use cadence_model::EquationModel;

/// Configuration for one model instance.
///
/// The variable declarations come from the equation itself
/// (`EquationModel::variables()`); the config adds the instance name,
/// the internal clock, and the `all_sync` reclassification flag.
pub struct ModelConfig {
    /// Instance name, used in couplings and diagnostics.
    pub name: String,
    /// The equation evaluated at each transition.
    pub equation: Box<dyn EquationModel>,
    /// Fixed internal recomputation step. `None` makes the model purely
    /// reactive: it recomputes only when a Sync/Async arrival triggers
    /// it.
    pub time_step: Option<f64>,
    /// Reclassify every external reference (declared or auto-discovered
    /// at coupling time) as Sync. Used by generic aggregators that must
    /// wait for all inputs.
    pub all_sync: bool,
}

impl ModelConfig {
    /// A reactive model with no internal clock.
    pub fn new(name: &str, equation: Box<dyn EquationModel>) -> Self {
        Self {
            name: name.to_string(),
            equation,
            time_step: None,
            all_sync: false,
        }
    }

    /// Set a fixed internal recomputation step.
    pub fn with_time_step(mut self, step: f64) -> Self {
        self.time_step = Some(step);
        self
    }

    /// Enable Sync reclassification of every external reference.
    pub fn with_all_sync(mut self) -> Self {
        self.all_sync = true;
        self
    }

    /// Check structural invariants that don't need the declarations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(step) = self.time_step {
            if !step.is_finite() || step <= 0.0 {
                return Err(ConfigError::InvalidTimeStep {
                    model: self.name.clone(),
                    value: step,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("name", &self.name)
            .field("equation", &self.equation.name())
            .field("time_step", &self.time_step)
            .field("all_sync", &self.all_sync)
            .finish()
    }
}

/// Errors detected while constructing a scheduler or coupled system.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// A variable declaration was rejected by the arena.
    History {
        /// The declaring model.
        model: String,
        /// The underlying declaration error.
        source: HistoryError,
    },
    /// The equation declared no variables at all.
    NoVariables {
        /// The offending model.
        model: String,
    },
    /// `time_step` is NaN, infinite, zero, or negative.
    InvalidTimeStep {
        /// The offending model.
        model: String,
        /// The invalid value.
        value: f64,
    },
    /// Two models share one instance name.
    DuplicateModel {
        /// The re-used name.
        model: String,
    },
    /// A coupling references a model that was never registered.
    UnknownModel {
        /// The unknown name.
        model: String,
    },
    /// A coupling references a port the model never declared (and the
    /// model did not opt into auto-discovery).
    UnknownDependency {
        /// The referencing model.
        model: String,
        /// The undeclared port.
        port: String,
    },
    /// A coupling targets an owned variable; only external references
    /// accept input.
    TargetNotExternal {
        /// The target model.
        model: String,
        /// The owned port.
        port: String,
    },
    /// A coupling's source port is not an owned variable.
    SourceNotOwned {
        /// The source model.
        model: String,
        /// The offending port.
        port: String,
    },
    /// Source and target ports declare different dimensions.
    DimensionMismatch {
        /// The source model.
        source_model: String,
        /// The source port.
        source_port: String,
        /// The target model.
        target_model: String,
        /// The target port.
        target_port: String,
    },
    /// The Sync couplings form a cycle; no deterministic same-instant
    /// order exists.
    DependencyCycle {
        /// The models on the cycle, in registration order.
        models: Vec<String>,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::History { model, source } => write!(f, "model '{model}': {source}"),
            Self::NoVariables { model } => {
                write!(f, "model '{model}' declares no variables")
            }
            Self::InvalidTimeStep { model, value } => write!(
                f,
                "model '{model}': time_step must be finite and positive, got {value}"
            ),
            Self::DuplicateModel { model } => {
                write!(f, "model name '{model}' registered twice")
            }
            Self::UnknownModel { model } => write!(f, "unknown model '{model}'"),
            Self::UnknownDependency { model, port } => {
                write!(f, "model '{model}' has no port '{port}'")
            }
            Self::TargetNotExternal { model, port } => {
                write!(f, "port '{port}' of model '{model}' is owned, cannot receive input")
            }
            Self::SourceNotOwned { model, port } => {
                write!(f, "port '{port}' of model '{model}' is not owned, cannot emit")
            }
            Self::DimensionMismatch {
                source_model,
                source_port,
                target_model,
                target_port,
            } => write!(
                f,
                "coupling {source_model}.{source_port} -> {target_model}.{target_port}: dimensions differ"
            ),
            Self::DependencyCycle { models } => {
                write!(f, "sync couplings form a cycle through: {}", models.join(", "))
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::History { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{ComputeError, VarDef};
    use cadence_model::ComputeContext;

    struct Dummy;
    impl EquationModel for Dummy {
        fn name(&self) -> &str {
            "dummy"
        }
        fn variables(&self) -> Vec<VarDef> {
            vec![VarDef::owned("x")]
        }
        fn compute(&self, _ctx: &mut ComputeContext<'_>) -> Result<(), ComputeError> {
            Ok(())
        }
    }

    #[test]
    fn negative_and_nan_time_steps_are_rejected() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = ModelConfig::new("m", Box::new(Dummy)).with_time_step(bad);
            match config.validate() {
                Err(ConfigError::InvalidTimeStep { model, .. }) => assert_eq!(model, "m"),
                other => panic!("expected InvalidTimeStep for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn reactive_config_validates() {
        let config = ModelConfig::new("m", Box::new(Dummy));
        assert!(config.validate().is_ok());
        assert!(config.time_step.is_none());
        assert!(!config.all_sync);
    }

    #[test]
    fn builder_sets_fields() {
        let config = ModelConfig::new("agg", Box::new(Dummy))
            .with_time_step(0.5)
            .with_all_sync();
        assert_eq!(config.time_step, Some(0.5));
        assert!(config.all_sync);
        assert_eq!(config.name, "agg");
    }
}
