use crate::error::TickpulseError;
use serde::{Deserialize, Serialize};

/// Per-symbol smoothing and noise-gate tuning.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ThresholdProfile {
    /// Fast EMA smoothing factor, in (0, 1]
    pub alpha_fast: f64,
    /// Slow EMA smoothing factor, in (0, 1]
    pub alpha_slow: f64,
    /// Velocity magnitude at or below which the signal is considered chop
    pub chop_limit: f64,
}

impl Default for ThresholdProfile {
    fn default() -> Self {
        Self {
            alpha_fast: 0.22,
            alpha_slow: 0.10,
            chop_limit: 0.05,
        }
    }
}

/// Tuned presets keyed by uppercase symbol.
///
/// High-priced or high-beta names get a wider chop band so that ordinary tick noise
/// does not register as a breakout.
const PRESETS: [(&str, ThresholdProfile); 7] = [
    (
        "SPY",
        ThresholdProfile {
            alpha_fast: 0.22,
            alpha_slow: 0.10,
            chop_limit: 0.05,
        },
    ),
    (
        "QQQ",
        ThresholdProfile {
            alpha_fast: 0.22,
            alpha_slow: 0.10,
            chop_limit: 0.06,
        },
    ),
    (
        "IWM",
        ThresholdProfile {
            alpha_fast: 0.25,
            alpha_slow: 0.12,
            chop_limit: 0.03,
        },
    ),
    (
        "DIA",
        ThresholdProfile {
            alpha_fast: 0.20,
            alpha_slow: 0.08,
            chop_limit: 0.08,
        },
    ),
    (
        "TSLA",
        ThresholdProfile {
            alpha_fast: 0.30,
            alpha_slow: 0.12,
            chop_limit: 0.25,
        },
    ),
    (
        "NVDA",
        ThresholdProfile {
            alpha_fast: 0.28,
            alpha_slow: 0.12,
            chop_limit: 0.20,
        },
    ),
    (
        "AAPL",
        ThresholdProfile {
            alpha_fast: 0.22,
            alpha_slow: 0.10,
            chop_limit: 0.06,
        },
    ),
];

impl ThresholdProfile {
    /// Build a profile, rejecting alphas outside (0, 1] and a non-positive chop limit.
    pub fn new(alpha_fast: f64, alpha_slow: f64, chop_limit: f64) -> Result<Self, TickpulseError> {
        let profile = Self {
            alpha_fast,
            alpha_slow,
            chop_limit,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), TickpulseError> {
        for (name, alpha) in [("alpha_fast", self.alpha_fast), ("alpha_slow", self.alpha_slow)] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(TickpulseError::InvalidProfile(format!(
                    "{name} must be in (0, 1], got {alpha}"
                )));
            }
        }

        if !(self.chop_limit > 0.0 && self.chop_limit.is_finite()) {
            return Err(TickpulseError::InvalidProfile(format!(
                "chop_limit must be > 0, got {}",
                self.chop_limit
            )));
        }

        Ok(())
    }

    /// Preset for `symbol` (case-insensitive), or the default profile when unknown.
    pub fn preset(symbol: &str) -> Self {
        PRESETS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(symbol.trim()))
            .map(|(_, profile)| *profile)
            .unwrap_or_default()
    }

    /// Copy with a new chop limit if it is `> 0`, otherwise `None`.
    pub fn with_chop_limit(&self, chop_limit: f64) -> Option<Self> {
        let candidate = Self {
            chop_limit,
            ..*self
        };
        candidate.validate().ok().map(|_| candidate)
    }
}
