use super::profile::ThresholdProfile;
use crate::error::TickpulseError;

/// Dual-EMA state for a single symbol.
///
/// `diff` is kept equal to `ema_fast - ema_slow` after every update.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MomentumState {
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub diff: f64,
    pub prev_diff: f64,
    pub initialized: bool,
}

/// Output of one accepted price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VelocityReading {
    /// First price after creation or reset. Never classified.
    Seed { price: f64 },
    /// Velocity before and after the update.
    Update { prev_diff: f64, diff: f64 },
}

impl VelocityReading {
    /// Current velocity, which is `0.0` for a seed.
    pub fn diff(&self) -> f64 {
        match self {
            VelocityReading::Seed { .. } => 0.0,
            VelocityReading::Update { diff, .. } => *diff,
        }
    }

    pub fn is_seed(&self) -> bool {
        matches!(self, VelocityReading::Seed { .. })
    }
}

/// Parse a raw feed price, accepting only positive finite numbers.
pub fn parse_price(raw: &str) -> Result<f64, TickpulseError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite() && *price > 0.0)
        .ok_or_else(|| TickpulseError::InvalidPrice(raw.to_string()))
}

/// Fast/slow exponential smoothing of price, producing a velocity signal.
#[derive(Debug, Clone)]
pub struct MomentumEngine {
    profile: ThresholdProfile,
    state: MomentumState,
}

impl MomentumEngine {
    pub fn new(profile: ThresholdProfile) -> Self {
        Self {
            profile,
            state: MomentumState::default(),
        }
    }

    /// Consume one price.
    ///
    /// Rejected prices (non-positive, NaN, infinite) leave the state untouched.
    pub fn update(&mut self, price: f64) -> Result<VelocityReading, TickpulseError> {
        if !(price.is_finite() && price > 0.0) {
            return Err(TickpulseError::InvalidPrice(price.to_string()));
        }

        if !self.state.initialized {
            self.state = MomentumState {
                ema_fast: price,
                ema_slow: price,
                diff: 0.0,
                prev_diff: 0.0,
                initialized: true,
            };
            return Ok(VelocityReading::Seed { price });
        }

        let ThresholdProfile {
            alpha_fast,
            alpha_slow,
            ..
        } = self.profile;

        let state = &mut self.state;
        state.prev_diff = state.diff;
        state.ema_fast = price * alpha_fast + state.ema_fast * (1.0 - alpha_fast);
        state.ema_slow = price * alpha_slow + state.ema_slow * (1.0 - alpha_slow);
        state.diff = state.ema_fast - state.ema_slow;

        Ok(VelocityReading::Update {
            prev_diff: state.prev_diff,
            diff: state.diff,
        })
    }

    /// Forget all smoothing so the next accepted price re-seeds.
    pub fn reset(&mut self) {
        self.state = MomentumState::default();
    }

    /// Replace the tuning. Smoothing state is kept.
    pub fn set_profile(&mut self, profile: ThresholdProfile) {
        self.profile = profile;
    }

    pub fn profile(&self) -> &ThresholdProfile {
        &self.profile
    }

    pub fn state(&self) -> &MomentumState {
        &self.state
    }

    pub fn diff(&self) -> f64 {
        self.state.diff
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized
    }
}

impl Default for MomentumEngine {
    fn default() -> Self {
        Self::new(ThresholdProfile::default())
    }
}
