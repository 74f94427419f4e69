//! Per-step metrics for the transition scheduler.
//!
//! [`StepMetrics`] captures timing and delivery data for a single
//! transition, enabling telemetry and double-delivery diagnostics.

/// Timing and delivery metrics collected during a single transition.
///
/// All durations are in microseconds. The scheduler populates these
/// after each `process()` call; consumers read them from the most
/// recent step.
#[derive(Clone, Debug, Default)]
pub struct StepMetrics {
    /// Wall-clock time for the entire transition, in microseconds.
    pub total_us: u64,
    /// Time spent applying bag values to variable histories.
    pub apply_us: u64,
    /// Time spent in the equation's `compute`.
    pub compute_us: u64,
    /// Time spent building output events.
    pub emit_us: u64,
    /// Per-port delivery counts for the processed bag, in first-arrival
    /// order: `(port label, notifications merged)`.
    pub deliveries: Vec<(String, u32)>,
    /// Notifications beyond the first per element in the processed bag.
    pub duplicate_deliveries: u32,
    /// Number of output events emitted by this transition.
    pub emitted_events: u32,
}
