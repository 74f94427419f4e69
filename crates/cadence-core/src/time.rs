//! Simulated-time types: [`Timestamp`] and [`TimeAdvance`].

use std::cmp::Ordering;
use std::fmt;

/// A point on the simulated timeline.
///
/// Wraps an `f64` but provides a *total* order (via [`f64::total_cmp`])
/// so timestamps can be sorted and compared for exact same-instant
/// identity. Two notifications belong to the same bag iff their
/// timestamps compare equal under this order.
#[derive(Clone, Copy, Debug)]
pub struct Timestamp(pub f64);

impl Timestamp {
    /// The conventional simulation start time, `t = 0`.
    pub const ZERO: Timestamp = Timestamp(0.0);

    /// The raw simulated time value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// The timestamp `self + delta` on the simulated timeline.
    pub fn advanced_by(self, delta: f64) -> Timestamp {
        Timestamp(self.0 + delta)
    }

    /// The delay from `earlier` to `self`, in simulated time units.
    pub fn since(self, earlier: Timestamp) -> f64 {
        self.0 - earlier.0
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<f64> for Timestamp {
    fn from(v: f64) -> Self {
        Self(v)
    }
}

/// The delay until a model's next self-scheduled recomputation.
///
/// Returned by the scheduler's `time_advance` query. `Infinity` means
/// the model is purely reactive: it never wakes up on its own and only
/// recomputes when an external arrival triggers it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimeAdvance {
    /// Recompute after this many simulated time units.
    Finite(f64),
    /// No self-scheduled recomputation.
    Infinity,
}

impl TimeAdvance {
    /// Whether this is [`TimeAdvance::Infinity`].
    pub fn is_infinite(self) -> bool {
        matches!(self, TimeAdvance::Infinity)
    }

    /// The finite delay, or `None` for `Infinity`.
    pub fn as_finite(self) -> Option<f64> {
        match self {
            TimeAdvance::Finite(d) => Some(d),
            TimeAdvance::Infinity => None,
        }
    }
}

impl fmt::Display for TimeAdvance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeAdvance::Finite(d) => write!(f, "{d}"),
            TimeAdvance::Infinity => write!(f, "inf"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_order_is_exact() {
        assert_eq!(Timestamp(1.5), Timestamp(1.5));
        assert!(Timestamp(1.0) < Timestamp(1.0 + f64::EPSILON));
        assert_ne!(Timestamp(5.0), Timestamp(5.0 + 1e-12));
    }

    #[test]
    fn advance_and_since_round_trip() {
        let t = Timestamp(3.0).advanced_by(0.5);
        assert_eq!(t, Timestamp(3.5));
        assert_eq!(t.since(Timestamp(3.0)), 0.5);
    }

    #[test]
    fn time_advance_accessors() {
        assert!(TimeAdvance::Infinity.is_infinite());
        assert_eq!(TimeAdvance::Finite(2.0).as_finite(), Some(2.0));
        assert_eq!(TimeAdvance::Infinity.as_finite(), None);
    }
}
