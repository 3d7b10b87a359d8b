//! Velocity history for downstream charting.

use crate::ring::FixedRing;

/// Number of velocity samples retained.
pub const HISTORY_LEN: usize = 120;

/// Fixed ring of the last [`HISTORY_LEN`] velocity samples, one per accepted tick.
///
/// Warm-up: until [`HISTORY_LEN`] ticks have been pushed, the oldest slots have never
/// been written. They are held as empty slots internally and read back as `0.0`.
#[derive(Debug, Clone, Default)]
pub struct VelocityHistory {
    ring: FixedRing<f64, HISTORY_LEN>,
}

impl VelocityHistory {
    /// Value reported for a slot that has not been written yet.
    pub const UNWRITTEN: f64 = 0.0;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.ring.push(value);
    }

    /// Exactly [`HISTORY_LEN`] samples, oldest first, last element most recent.
    pub fn chronological(&self) -> Vec<f64> {
        self.ring
            .chronological()
            .map(|slot| slot.copied().unwrap_or(Self::UNWRITTEN))
            .collect()
    }

    pub fn latest(&self) -> Option<f64> {
        self.ring.latest().copied()
    }

    /// Samples written so far, capped at [`HISTORY_LEN`].
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}
