//! Trace types and the in-memory recorder.

use cadence_core::Timestamp;

/// One output event as recorded in a trace.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceEmission {
    /// The emitting model.
    pub model: String,
    /// The output port.
    pub port: String,
    /// The element index for vector ports.
    pub element: Option<u32>,
    /// The emitted value.
    pub value: f64,
}

/// Everything emitted during one processed instant, in processing
/// order.
#[derive(Clone, Debug, PartialEq)]
pub struct StepTrace {
    /// The processed instant.
    pub time: Timestamp,
    /// Emissions in deterministic processing order.
    pub emissions: Vec<TraceEmission>,
}

impl StepTrace {
    /// An empty trace entry for one instant.
    pub fn new(time: Timestamp) -> Self {
        Self {
            time,
            emissions: Vec::new(),
        }
    }

    /// Append one emission.
    pub fn push(
        &mut self,
        model: impl Into<String>,
        port: impl Into<String>,
        element: Option<u32>,
        value: f64,
    ) {
        self.emissions.push(TraceEmission {
            model: model.into(),
            port: port.into(),
            element,
            value,
        });
    }
}

/// Accumulates [`StepTrace`]s over a run.
#[derive(Clone, Debug, Default)]
pub struct TraceRecorder {
    steps: Vec<StepTrace>,
}

impl TraceRecorder {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one processed instant.
    pub fn record(&mut self, step: StepTrace) {
        self.steps.push(step);
    }

    /// The recorded steps in order.
    pub fn steps(&self) -> &[StepTrace] {
        &self.steps
    }

    /// Number of recorded instants.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Consume the recorder, returning the trace.
    pub fn into_steps(self) -> Vec<StepTrace> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_keeps_steps_in_order() {
        let mut rec = TraceRecorder::new();
        let mut a = StepTrace::new(Timestamp(1.0));
        a.push("m", "out", None, 1.0);
        let b = StepTrace::new(Timestamp(2.0));
        rec.record(a);
        rec.record(b);

        assert_eq!(rec.len(), 2);
        assert_eq!(rec.steps()[0].time, Timestamp(1.0));
        assert_eq!(rec.steps()[0].emissions.len(), 1);
        assert!(rec.steps()[1].emissions.is_empty());
    }
}
