//! Bounded, most-recent-first log of classified momentum events.

use crate::{momentum::EventKind, ring::FixedRing};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};

/// Number of alert slots.
pub const ALERT_SLOTS: usize = 5;

/// One classified event
#[derive(Debug, Clone, PartialEq, Constructor, Deserialize, Serialize)]
pub struct AlertEvent {
    /// Local time of day, `HH:MM:SS`
    pub timestamp: String,
    pub kind: EventKind,
    /// Velocity at trigger
    pub value: f64,
}

/// The last [`ALERT_SLOTS`] events. Slot 0 is always the most recently recorded one.
#[derive(Debug, Clone, Default)]
pub struct AlertLog {
    ring: FixedRing<AlertEvent, ALERT_SLOTS>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new event in slot 0, evicting the oldest once all slots are used.
    pub fn record(&mut self, kind: EventKind, value: f64, timestamp: impl Into<String>) {
        self.ring.push(AlertEvent::new(timestamp.into(), kind, value));
    }

    /// Recorded events, most recent first, empty slots skipped.
    pub fn snapshot(&self) -> Vec<AlertEvent> {
        self.ring.recent_first().flatten().cloned().collect()
    }

    pub fn latest(&self) -> Option<&AlertEvent> {
        self.ring.latest()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_log_snapshot() {
        let log = AlertLog::new();
        assert!(log.snapshot().is_empty());
        assert!(log.latest().is_none());
    }

    #[test]
    fn test_record_places_newest_in_slot_zero() {
        let mut log = AlertLog::new();
        log.record(EventKind::BullBreak, 0.12, "09:31:00");
        log.record(EventKind::BullRush, 0.20, "09:31:02");

        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].kind, EventKind::BullRush);
        assert_eq!(snapshot[0].timestamp, "09:31:02");
        assert_eq!(snapshot[1].kind, EventKind::BullBreak);
    }

    #[test]
    fn test_record_evicts_oldest_beyond_capacity() {
        let mut log = AlertLog::new();
        let kinds = [
            EventKind::BullBreak,
            EventKind::BullRush,
            EventKind::TrendEnd,
            EventKind::BearBreak,
            EventKind::BearDump,
            EventKind::TrendEnd,
            EventKind::BullBreak,
        ];
        for (i, kind) in kinds.into_iter().enumerate() {
            log.record(kind, i as f64, format!("10:00:{i:02}"));
        }

        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), ALERT_SLOTS);
        assert_eq!(log.len(), ALERT_SLOTS);

        // strictly reverse-chronological
        let values: Vec<f64> = snapshot.iter().map(|e| e.value).collect();
        assert_eq!(values, vec![6.0, 5.0, 4.0, 3.0, 2.0]);
        assert_eq!(log.latest().map(|e| e.kind), Some(EventKind::BullBreak));
    }
}
