//! Hashing utilities for trace comparison.
//!
//! Uses FNV-1a for fast, deterministic hashing of recorded traces.
//! These hashes are not cryptographically secure — they are used for
//! fast equality checks during replay comparison.

use crate::trace::StepTrace;

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

#[inline]
fn fnv1a_byte(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

#[inline]
fn fnv1a_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash = fnv1a_byte(hash, b);
    }
    hash
}

#[inline]
fn fnv1a_u64(hash: u64, v: u64) -> u64 {
    fnv1a_bytes(hash, &v.to_le_bytes())
}

/// Compute a hash over a full trace.
///
/// Folds in each step's instant (as f64 bits) at step boundaries and
/// every emission's model, port, element, and value bits, so step order
/// and emission order both matter.
pub fn trace_hash(steps: &[StepTrace]) -> u64 {
    let mut hash = FNV_OFFSET;
    for step in steps {
        hash = fnv1a_u64(hash, step.time.value().to_bits());
        for e in &step.emissions {
            hash = fnv1a_bytes(hash, e.model.as_bytes());
            hash = fnv1a_bytes(hash, e.port.as_bytes());
            hash = fnv1a_u64(hash, e.element.map_or(u64::MAX, u64::from));
            hash = fnv1a_u64(hash, e.value.to_bits());
        }
    }
    hash
}
