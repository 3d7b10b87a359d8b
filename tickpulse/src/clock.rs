//! Time sources for the momentum pipeline.
//!
//! Timing decisions use a monotonic millisecond counter, while the polling scheduler and
//! alert timestamps use the local wall clock.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use parking_lot::Mutex;
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};

/// Local wall-clock reading used by the polling scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    pub weekday: Weekday,
    pub hour: u32,
    pub minute: u32,
}

impl LocalTime {
    pub fn new(weekday: Weekday, hour: u32, minute: u32) -> Self {
        Self {
            weekday,
            hour,
            minute,
        }
    }

    fn from_datetime(datetime: &NaiveDateTime) -> Self {
        Self::new(datetime.weekday(), datetime.hour(), datetime.minute())
    }
}

/// Source of monotonic and local time.
pub trait Clock: Send + Sync {
    /// Monotonic milliseconds. May wrap; consumers use wrapping arithmetic.
    fn now_ms(&self) -> u64;

    /// Current local weekday, hour and minute.
    fn local_time(&self) -> LocalTime;

    /// Current local time formatted as `HH:MM:SS`.
    fn time_of_day(&self) -> String;
}

/// Production clock backed by [`Instant`] and [`chrono::Local`].
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn local_time(&self) -> LocalTime {
        LocalTime::from_datetime(&Local::now().naive_local())
    }

    fn time_of_day(&self) -> String {
        Local::now().format("%H:%M:%S").to_string()
    }
}

/// Deterministic clock driven by hand, shared cheaply between tasks.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
    local: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    /// Start at monotonic `0` and the given local datetime.
    pub fn new(local: NaiveDateTime) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(0)),
            local: Arc::new(Mutex::new(local)),
        }
    }

    /// Convenience constructor for a local date and `HH:MM:SS`.
    ///
    /// Out of range components fall back to midnight on 2024-01-01 (a Monday).
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default());
        let time = NaiveTime::from_hms_opt(hour, minute, second).unwrap_or_default();
        Self::new(NaiveDateTime::new(date, time))
    }

    pub fn set_ms(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::Relaxed);
    }

    /// Advance both the monotonic counter and the local clock.
    pub fn advance_ms(&self, delta_ms: u64) {
        let _ = self
            .now_ms
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |now| {
                Some(now.wrapping_add(delta_ms))
            });
        let mut local = self.local.lock();
        *local += chrono::Duration::milliseconds(delta_ms as i64);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::Relaxed)
    }

    fn local_time(&self) -> LocalTime {
        LocalTime::from_datetime(&self.local.lock())
    }

    fn time_of_day(&self) -> String {
        self.local.lock().format("%H:%M:%S").to_string()
    }
}
