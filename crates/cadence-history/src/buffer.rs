//! Shift-addressed storage of one variable element's committed values.
//!
//! [`HistoryBuffer`] keeps a monotonic commit position and addresses
//! slots as `position % capacity`, so the retained window slides without
//! moving data. Unbounded buffers append instead of wrapping.

use cadence_core::HistoryPolicy;

/// Committed-value storage for a single variable element.
///
/// Shift 0 addresses the most recently committed value, −1 the one
/// before, and so on. A bounded buffer retains the most recent `depth`
/// commits; older entries are overwritten in place. An unbounded buffer
/// retains everything.
#[derive(Clone, Debug)]
pub struct HistoryBuffer {
    slots: Vec<f64>,
    committed: u64,
    capacity: Option<usize>,
}

impl HistoryBuffer {
    /// Create an empty buffer with the given retention policy.
    ///
    /// Callers validate the policy first; `Bounded(0)` is rejected at
    /// declaration and never reaches the buffer.
    pub fn new(policy: HistoryPolicy) -> Self {
        match policy {
            HistoryPolicy::Bounded(depth) => Self {
                slots: vec![0.0; depth],
                committed: 0,
                capacity: Some(depth),
            },
            HistoryPolicy::Unbounded => Self {
                slots: Vec::new(),
                committed: 0,
                capacity: None,
            },
        }
    }

    /// Commit a new head value, shifting older entries one step back.
    pub fn push(&mut self, value: f64) {
        match self.capacity {
            Some(cap) => {
                let slot = (self.committed % cap as u64) as usize;
                self.slots[slot] = value;
            }
            None => self.slots.push(value),
        }
        self.committed += 1;
    }

    /// Overwrite the head value without shifting.
    ///
    /// Used for the idempotent-per-instant write rule: a second write at
    /// the same simulated instant replaces the pending head rather than
    /// pushing a new entry.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is empty; callers guarantee a prior `push`.
    pub fn replace_head(&mut self, value: f64) {
        assert!(self.committed > 0, "replace_head on empty history");
        match self.capacity {
            Some(cap) => {
                let slot = ((self.committed - 1) % cap as u64) as usize;
                self.slots[slot] = value;
            }
            None => {
                let last = self.slots.len() - 1;
                self.slots[last] = value;
            }
        }
    }

    /// The value at a non-positive shift, or `None` if the shift runs
    /// past the retained window (or is positive).
    pub fn read(&self, shift: i32) -> Option<f64> {
        if shift > 0 {
            return None;
        }
        let back = shift.unsigned_abs() as u64;
        if back >= self.retained() as u64 {
            return None;
        }
        let pos = self.committed - 1 - back;
        let idx = match self.capacity {
            Some(cap) => (pos % cap as u64) as usize,
            None => pos as usize,
        };
        Some(self.slots[idx])
    }

    /// Number of committed entries currently readable.
    pub fn retained(&self) -> usize {
        match self.capacity {
            Some(cap) => self.committed.min(cap as u64) as usize,
            None => self.committed as usize,
        }
    }

    /// Total number of commits ever made, including evicted ones.
    pub fn committed(&self) -> u64 {
        self.committed
    }

    /// Whether nothing has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.committed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_buffer_reads_nothing() {
        let buf = HistoryBuffer::new(HistoryPolicy::Bounded(3));
        assert!(buf.is_empty());
        assert_eq!(buf.read(0), None);
        assert_eq!(buf.retained(), 0);
    }

    #[test]
    fn shifts_address_strictly_older_values() {
        let mut buf = HistoryBuffer::new(HistoryPolicy::Bounded(3));
        buf.push(1.0);
        buf.push(2.0);
        buf.push(3.0);
        assert_eq!(buf.read(0), Some(3.0));
        assert_eq!(buf.read(-1), Some(2.0));
        assert_eq!(buf.read(-2), Some(1.0));
        assert_eq!(buf.read(-3), None);
    }

    #[test]
    fn bounded_buffer_evicts_oldest() {
        let mut buf = HistoryBuffer::new(HistoryPolicy::Bounded(2));
        buf.push(1.0);
        buf.push(2.0);
        buf.push(3.0);
        assert_eq!(buf.read(0), Some(3.0));
        assert_eq!(buf.read(-1), Some(2.0));
        assert_eq!(buf.read(-2), None);
        assert_eq!(buf.retained(), 2);
        assert_eq!(buf.committed(), 3);
    }

    #[test]
    fn replace_head_does_not_shift() {
        let mut buf = HistoryBuffer::new(HistoryPolicy::Bounded(2));
        buf.push(1.0);
        buf.push(2.0);
        buf.replace_head(9.0);
        assert_eq!(buf.read(0), Some(9.0));
        assert_eq!(buf.read(-1), Some(1.0));
        assert_eq!(buf.committed(), 2);
    }

    #[test]
    fn positive_shift_is_rejected() {
        let mut buf = HistoryBuffer::new(HistoryPolicy::Bounded(2));
        buf.push(1.0);
        assert_eq!(buf.read(1), None);
    }

    #[test]
    fn unbounded_buffer_retains_everything() {
        let mut buf = HistoryBuffer::new(HistoryPolicy::Unbounded);
        for i in 0..100 {
            buf.push(i as f64);
        }
        assert_eq!(buf.retained(), 100);
        assert_eq!(buf.read(-99), Some(0.0));
        assert_eq!(buf.read(0), Some(99.0));
    }

    #[test]
    #[should_panic(expected = "replace_head on empty history")]
    fn replace_head_on_empty_panics() {
        let mut buf = HistoryBuffer::new(HistoryPolicy::Bounded(2));
        buf.replace_head(1.0);
    }

    proptest! {
        // Committing values 0..n into a buffer of depth d leaves the most
        // recent min(n, d) values readable, in order, and nothing deeper.
        #[test]
        fn retention_window_property(n in 1usize..64, d in 1usize..16) {
            let mut buf = HistoryBuffer::new(HistoryPolicy::Bounded(d));
            for i in 0..n {
                buf.push(i as f64);
            }
            let window = n.min(d);
            for back in 0..window {
                prop_assert_eq!(buf.read(-(back as i32)), Some((n - 1 - back) as f64));
            }
            prop_assert_eq!(buf.read(-(window as i32)), None);
        }

        // A replace_head after any number of pushes leaves the retained
        // count unchanged and only the head value different.
        #[test]
        fn replace_head_preserves_window(n in 1usize..32, d in 2usize..8) {
            let mut buf = HistoryBuffer::new(HistoryPolicy::Bounded(d));
            for i in 0..n {
                buf.push(i as f64);
            }
            let before = buf.retained();
            let prev = buf.read(-1);
            buf.replace_head(f64::MAX);
            prop_assert_eq!(buf.retained(), before);
            prop_assert_eq!(buf.read(0), Some(f64::MAX));
            prop_assert_eq!(buf.read(-1), prev);
        }
    }
}
