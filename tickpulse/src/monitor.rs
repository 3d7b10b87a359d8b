//! Single-writer momentum pipeline.
//!
//! A price tick flows: validate -> [`MomentumEngine`] -> [`classify`] -> [`AlertLog`] and
//! [`AudioCommand`], while [`VelocityHistory`] records every accepted tick, seed included.
//! Readers never touch the monitor directly; they get an immutable [`MonitorSnapshot`].

use crate::{
    alert_log::{AlertEvent, AlertLog},
    audio::AudioCommand,
    clock::Clock,
    error::TickpulseError,
    history::VelocityHistory,
    momentum::{EventKind, MomentumEngine, ThresholdProfile, VelocityReading, classify, parse_price},
    settings::{Settings, normalise_symbol},
};
use serde::Deserialize;
use smol_str::SmolStr;
use tracing::{debug, info};

/// Admin requests from an operator surface
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AdminCommand {
    /// Switch symbol, re-seed the engine and apply the symbol's preset
    SetSymbol { symbol: String },
    SetMute { muted: bool },
    ToggleMute,
    /// Override the chop limit. Ignored unless `> 0`.
    SetChopLimit { chop_limit: f64 },
    /// Inject a classified event without a real tick
    TestAlert { kind: EventKind },
}

/// Result of one accepted tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub reading: VelocityReading,
    pub alert: Option<AlertEvent>,
    pub command: Option<AudioCommand>,
}

/// Immutable view of the monitor for rendering and reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSnapshot {
    pub symbol: SmolStr,
    /// Last accepted price, `None` before the first valid tick
    pub price: Option<f64>,
    pub diff: f64,
    pub alerts: Vec<AlertEvent>,
    /// Exactly `HISTORY_LEN` samples, oldest first
    pub history: Vec<f64>,
    pub profile: ThresholdProfile,
    pub muted: bool,
    pub ticks: u64,
}

/// Owns all momentum state for the active symbol.
#[derive(Debug, Clone)]
pub struct MomentumMonitor {
    settings: Settings,
    engine: MomentumEngine,
    alerts: AlertLog,
    history: VelocityHistory,
    last_price: Option<f64>,
    ticks: u64,
    save_needed: bool,
}

impl MomentumMonitor {
    pub fn new(settings: Settings) -> Self {
        Self {
            engine: MomentumEngine::new(settings.profile),
            settings,
            alerts: AlertLog::new(),
            history: VelocityHistory::new(),
            last_price: None,
            ticks: 0,
            save_needed: false,
        }
    }

    /// Run one raw price through the pipeline.
    ///
    /// Invalid prices return [`TickpulseError::InvalidPrice`] and change nothing. The seed
    /// tick is recorded in history as `0.0` but never classified.
    pub fn ingest(&mut self, raw: &str, clock: &dyn Clock) -> Result<TickOutcome, TickpulseError> {
        let price = parse_price(raw)?;
        let reading = self.engine.update(price)?;
        if reading.is_seed() {
            debug!(symbol = %self.settings.symbol, price, "momentum engine seeded");
        }
        self.last_price = Some(price);
        self.ticks += 1;

        let (alert, command) = match reading {
            VelocityReading::Seed { .. } => (None, None),
            VelocityReading::Update { prev_diff, diff } => {
                match classify(prev_diff, diff, self.settings.profile.chop_limit) {
                    Some(kind) => {
                        let (alert, command) = self.raise(kind, diff, clock);
                        (Some(alert), Some(command))
                    }
                    None => (None, None),
                }
            }
        };

        self.history.push(reading.diff());

        Ok(TickOutcome {
            reading,
            alert,
            command,
        })
    }

    /// Apply an admin command, returning a tone to play if one was triggered.
    pub fn apply(&mut self, command: AdminCommand, clock: &dyn Clock) -> Option<AudioCommand> {
        match command {
            AdminCommand::SetSymbol { symbol } => {
                let symbol = normalise_symbol(&symbol);
                if symbol.is_empty() {
                    debug!("ignoring empty symbol change");
                    return None;
                }
                self.settings = Settings {
                    muted: self.settings.muted,
                    ..Settings::for_symbol(&symbol)
                };
                self.engine = MomentumEngine::new(self.settings.profile);
                self.last_price = None;
                self.save_needed = true;
                info!(
                    symbol = %self.settings.symbol,
                    chop_limit = self.settings.profile.chop_limit,
                    "symbol changed"
                );
                None
            }
            AdminCommand::SetMute { muted } => {
                if self.settings.muted != muted {
                    self.settings.muted = muted;
                    self.save_needed = true;
                }
                None
            }
            AdminCommand::ToggleMute => {
                self.settings.muted = !self.settings.muted;
                self.save_needed = true;
                info!(muted = self.settings.muted, "mute toggled");
                None
            }
            AdminCommand::SetChopLimit { chop_limit } => {
                match self.settings.profile.with_chop_limit(chop_limit) {
                    Some(profile) => {
                        self.settings.profile = profile;
                        self.engine.set_profile(profile);
                        self.save_needed = true;
                        info!(chop_limit, "chop limit overridden");
                    }
                    None => debug!(chop_limit, "ignoring non-positive chop limit"),
                }
                None
            }
            AdminCommand::TestAlert { kind } => {
                let (_, command) = self.raise(kind, self.engine.diff(), clock);
                Some(command)
            }
        }
    }

    fn raise(
        &mut self,
        kind: EventKind,
        value: f64,
        clock: &dyn Clock,
    ) -> (AlertEvent, AudioCommand) {
        let alert = AlertEvent::new(clock.time_of_day(), kind, value);
        info!(
            symbol = %self.settings.symbol,
            event = %kind,
            diff = value,
            timestamp = %alert.timestamp,
            "momentum event"
        );
        self.alerts.record(kind, value, alert.timestamp.clone());
        (alert, AudioCommand::for_event(kind, clock.now_ms()))
    }

    /// Settings to persist, if anything changed since the last call.
    pub fn take_save_needed(&mut self) -> Option<Settings> {
        std::mem::take(&mut self.save_needed).then(|| self.settings.clone())
    }

    pub fn save_needed(&self) -> bool {
        self.save_needed
    }

    /// Current velocity, or [`TickpulseError::Uninitialized`] before the first valid price.
    pub fn velocity(&self) -> Result<f64, TickpulseError> {
        if self.engine.is_initialized() {
            Ok(self.engine.diff())
        } else {
            Err(TickpulseError::Uninitialized)
        }
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            symbol: self.settings.symbol.clone(),
            price: self.last_price,
            diff: self.engine.diff(),
            alerts: self.alerts.snapshot(),
            history: self.history.chronological(),
            profile: self.settings.profile,
            muted: self.settings.muted,
            ticks: self.ticks,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn engine(&self) -> &MomentumEngine {
        &self.engine
    }

    pub fn alerts(&self) -> &AlertLog {
        &self.alerts
    }

    pub fn history(&self) -> &VelocityHistory {
        &self.history
    }
}

impl Default for MomentumMonitor {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
