//! Non-blocking alert tone sequencer.
//!
//! [`AudioSequencer::poll`] is called on every pass of the render loop and returns whether
//! the tone should currently sound. It never sleeps. A new command always replaces
//! whatever is playing; nothing is queued.

use crate::momentum::EventKind;

/// Total length of a stutter pattern, whatever duration was requested.
pub const STUTTER_TOTAL_MS: u64 = 300;
/// One on/off stutter cycle.
pub const STUTTER_PERIOD_MS: u64 = 80;
/// On portion of a stutter cycle.
pub const STUTTER_ON_MS: u64 = 40;

/// Shape of an alert tone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TonePattern {
    Solid,
    Stutter,
}

/// Latest tone request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioCommand {
    pub pattern: TonePattern,
    /// Requested length. Only honoured by [`TonePattern::Solid`].
    pub duration_ms: u64,
    /// Monotonic clock reading when the command was issued
    pub issued_at_ms: u64,
}

impl AudioCommand {
    pub fn new(pattern: TonePattern, duration_ms: u64, issued_at_ms: u64) -> Self {
        Self {
            pattern,
            duration_ms,
            issued_at_ms,
        }
    }

    /// Tone associated with each classified event.
    pub fn for_event(kind: EventKind, issued_at_ms: u64) -> Self {
        let (pattern, duration_ms) = match kind {
            EventKind::BullBreak => (TonePattern::Solid, 200),
            EventKind::BearBreak => (TonePattern::Solid, 400),
            EventKind::BullRush | EventKind::BearDump => (TonePattern::Stutter, STUTTER_TOTAL_MS),
            EventKind::TrendEnd => (TonePattern::Solid, 80),
        };
        Self::new(pattern, duration_ms, issued_at_ms)
    }
}

/// Sequencer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToneState {
    #[default]
    Idle,
    ToneSolid,
    ToneStutter,
    /// Silent lead-in before a stutter. Only entered through
    /// [`AudioSequencer::start_gap`]; event tones never use it.
    Gap,
}

/// Tone state machine driven by a monotonic millisecond clock.
///
/// Elapsed time is computed with wrapping subtraction so a wrapped clock still yields
/// the right interval.
#[derive(Debug, Clone, Default)]
pub struct AudioSequencer {
    state: ToneState,
    command: Option<AudioCommand>,
    /// Start of the current state
    started_at_ms: u64,
    gap_ms: u64,
    muted: bool,
}

impl AudioSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playing `command`, overriding anything in progress.
    pub fn issue(&mut self, command: AudioCommand) {
        self.state = match command.pattern {
            TonePattern::Solid => ToneState::ToneSolid,
            TonePattern::Stutter => ToneState::ToneStutter,
        };
        self.started_at_ms = command.issued_at_ms;
        self.command = Some(command);
        tracing::trace!(state = ?self.state, duration_ms = command.duration_ms, "tone issued");
    }

    /// Enter a silent gap of `gap_ms` that is followed by a stutter.
    pub fn start_gap(&mut self, now_ms: u64, gap_ms: u64) {
        self.state = ToneState::Gap;
        self.started_at_ms = now_ms;
        self.gap_ms = gap_ms;
        self.command = Some(AudioCommand::new(TonePattern::Stutter, STUTTER_TOTAL_MS, now_ms));
    }

    /// Advance the state machine and return whether the tone is on.
    ///
    /// While muted the state machine keeps advancing and only the output is forced off,
    /// so unmuting mid-tone resumes wherever the timer has reached.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let elapsed = now_ms.wrapping_sub(self.started_at_ms);

        let on = match self.state {
            ToneState::Idle => false,
            ToneState::ToneSolid => {
                let duration = self.command.map(|c| c.duration_ms).unwrap_or(0);
                if elapsed < duration {
                    true
                } else {
                    self.finish();
                    false
                }
            }
            ToneState::ToneStutter => {
                if elapsed < STUTTER_TOTAL_MS {
                    elapsed % STUTTER_PERIOD_MS < STUTTER_ON_MS
                } else {
                    self.finish();
                    false
                }
            }
            ToneState::Gap => {
                if elapsed >= self.gap_ms {
                    self.state = ToneState::ToneStutter;
                    self.started_at_ms = now_ms;
                    tracing::trace!("gap elapsed, starting stutter");
                }
                false
            }
        };

        on && !self.muted
    }

    fn finish(&mut self) {
        self.state = ToneState::Idle;
        tracing::trace!("tone finished");
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn state(&self) -> ToneState {
        self.state
    }

    pub fn command(&self) -> Option<&AudioCommand> {
        self.command.as_ref()
    }
}
