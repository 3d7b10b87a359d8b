use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Velocity must grow by more than this factor, on the same side of the chop band, to
/// count as acceleration.
pub const ACCELERATION_FACTOR: f64 = 1.20;

/// Classified momentum event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Velocity left the chop band upward.
    #[display("BULL_BREAK")]
    BullBreak,
    /// Already trending up and velocity grew by more than 20%.
    #[display("BULL_RUSH")]
    BullRush,
    /// Velocity left the chop band downward.
    #[display("BEAR_BREAK")]
    BearBreak,
    /// Already trending down and velocity became more than 20% more negative.
    #[display("BEAR_DUMP")]
    BearDump,
    /// Velocity re-entered the chop band after trending.
    #[display("TREND_END")]
    TrendEnd,
}

/// Decide which event, if any, the move from `prev_diff` to `diff` represents.
///
/// Checks are a single ordered chain so at most one event fires per tick: a breakout
/// always wins over an acceleration.
pub fn classify(prev_diff: f64, diff: f64, chop_limit: f64) -> Option<EventKind> {
    if diff.abs() > chop_limit {
        if diff > 0.0 {
            if prev_diff <= chop_limit {
                Some(EventKind::BullBreak)
            } else if diff > prev_diff * ACCELERATION_FACTOR {
                Some(EventKind::BullRush)
            } else {
                None
            }
        } else if prev_diff >= -chop_limit {
            Some(EventKind::BearBreak)
        } else if diff < prev_diff * ACCELERATION_FACTOR {
            // Both negative here, so "less than" means more negative
            Some(EventKind::BearDump)
        } else {
            None
        }
    } else if prev_diff.abs() > chop_limit {
        Some(EventKind::TrendEnd)
    } else {
        None
    }
}
