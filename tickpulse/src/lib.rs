//! Tickpulse - momentum alerting for a single live price feed
//!
//! Turns a stream of last-trade prices into:
//! - A dual-EMA velocity signal and classified momentum events
//! - A five-slot alert log and a 120-sample velocity history for display
//! - Non-blocking alert tones driven from a render loop
//! - A time-of-day polling schedule for the tick source
//!
//! The core types are synchronous and single-writer; [`runtime`] wires them together with
//! tokio tasks and channels.

pub mod alert_log;
pub mod audio;
pub mod clock;
pub mod error;
pub mod history;
pub mod momentum;
pub mod monitor;
pub mod report;
pub mod ring;
pub mod runtime;
pub mod schedule;
pub mod settings;

// Re-export commonly used types for convenience
pub use alert_log::{ALERT_SLOTS, AlertEvent, AlertLog};
pub use audio::{AudioCommand, AudioSequencer, TonePattern, ToneState};
pub use clock::{Clock, LocalTime, ManualClock, SystemClock};
pub use error::TickpulseError;
pub use history::{HISTORY_LEN, VelocityHistory};
pub use momentum::{EventKind, MomentumEngine, MomentumState, ThresholdProfile, VelocityReading};
pub use monitor::{AdminCommand, MomentumMonitor, MonitorSnapshot, TickOutcome};
pub use report::{Report, StatusReport};
pub use schedule::{PollTier, interval_seconds};
pub use settings::{Settings, TickpulseConfig};
