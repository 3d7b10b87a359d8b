//! Dual-EMA momentum engine and its event classifier.
//!
//! Provides:
//! - Fast/slow exponential smoothing of price into a velocity (`diff`) signal
//! - Breakout, acceleration and trend-death classification against a chop band
//! - Per-symbol threshold presets

mod classifier;
mod engine;
mod profile;

pub use classifier::{ACCELERATION_FACTOR, EventKind, classify};
pub use engine::{MomentumEngine, MomentumState, VelocityReading, parse_price};
pub use profile::ThresholdProfile;
