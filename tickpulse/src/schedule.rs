//! Time-of-day polling scheduler.
//!
//! Maps local weekday/hour/minute to how often the tick source should be asked for a new
//! price. Boundaries are whole hour/minute comparisons, so 09:29 and 09:30 land in
//! different tiers.

use crate::clock::LocalTime;
use chrono::Weekday;
use serde::Serialize;

/// Named polling-interval band
#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollTier {
    WeekendSleep, // Sat/Sun, any hour
    OffHours,     // before 08:30, from 16:00
    Turbo,        // 09:30 - 10:59, 15:00 - 15:59
    Lunch,        // 12:00 - 12:59
    Standard,     // 08:30 - 09:29, 11:00 - 11:59, 13:00 - 14:59
}

impl PollTier {
    pub fn from_local(weekday: Weekday, hour: u32, minute: u32) -> Self {
        if matches!(weekday, Weekday::Sat | Weekday::Sun) {
            return PollTier::WeekendSleep;
        }

        if hour < 8 || (hour == 8 && minute < 30) || hour >= 16 {
            return PollTier::OffHours;
        }

        match hour {
            9 if minute >= 30 => PollTier::Turbo,
            10 | 15 => PollTier::Turbo,
            12 => PollTier::Lunch,
            _ => PollTier::Standard,
        }
    }

    pub fn interval_seconds(&self) -> u64 {
        match self {
            PollTier::WeekendSleep => 300,
            PollTier::OffHours => 60,
            PollTier::Turbo => 2,
            PollTier::Lunch => 10,
            PollTier::Standard => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PollTier::WeekendSleep => "WEEKEND",
            PollTier::OffHours => "SLEEP",
            PollTier::Turbo => "TURBO",
            PollTier::Lunch => "LUNCH",
            PollTier::Standard => "STANDARD",
        }
    }
}

impl From<LocalTime> for PollTier {
    fn from(time: LocalTime) -> Self {
        PollTier::from_local(time.weekday, time.hour, time.minute)
    }
}

/// Recommended seconds between tick requests for the given local time.
pub fn interval_seconds(weekday: Weekday, hour: u32, minute: u32) -> u64 {
    PollTier::from_local(weekday, hour, minute).interval_seconds()
}
