use crate::{
    audio::{AudioCommand, AudioSequencer},
    clock::Clock,
    monitor::MonitorSnapshot,
    report::StatusReport,
    schedule::PollTier,
    settings::MIN_INTERVAL,
};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{broadcast, watch},
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info};

/// Actuator for the alert tone, e.g. a buzzer pin or a sound device.
pub trait ToneOutput: Send {
    /// Driven once per render pass with the sequencer's current output.
    fn set_tone(&mut self, on: bool);
}

/// [`ToneOutput`] that only traces transitions.
#[derive(Debug, Default)]
pub struct LogToneOutput {
    on: bool,
}

impl ToneOutput for LogToneOutput {
    fn set_tone(&mut self, on: bool) {
        if on != self.on {
            self.on = on;
            debug!(on, "tone");
        }
    }
}

/// Inputs and outputs of the render loop.
pub struct RenderLoop<Output> {
    pub clock: Arc<dyn Clock>,
    pub audio: watch::Receiver<Option<AudioCommand>>,
    pub snapshots: watch::Receiver<Arc<MonitorSnapshot>>,
    pub tier: watch::Sender<PollTier>,
    pub reports: broadcast::Sender<StatusReport>,
    pub output: Output,
    pub render_interval: Duration,
    pub report_interval: Duration,
}

/// Drive the tone sequencer, the polling tier and the report sink until the audio channel
/// closes, which happens when the ingestion task stops.
pub async fn run_render_loop<Output>(render: RenderLoop<Output>)
where
    Output: ToneOutput,
{
    let RenderLoop {
        clock,
        mut audio,
        snapshots,
        tier,
        reports,
        mut output,
        render_interval,
        report_interval,
    } = render;

    let mut render_timer = interval(render_interval.max(MIN_INTERVAL));
    render_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut report_timer = interval(report_interval.max(MIN_INTERVAL));
    report_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut sequencer = AudioSequencer::new();

    loop {
        tokio::select! {
            _ = render_timer.tick() => {
                let closed = match audio.has_changed() {
                    Ok(true) => {
                        if let Some(command) = *audio.borrow_and_update() {
                            sequencer.issue(command);
                        }
                        false
                    }
                    Ok(false) => false,
                    Err(_) => true,
                };
                sequencer.set_muted(snapshots.borrow().muted);

                let on = sequencer.poll(clock.now_ms()) && !closed;
                output.set_tone(on);

                if closed {
                    break;
                }
            }
            _ = report_timer.tick() => {
                let current = PollTier::from(clock.local_time());
                tier.send_if_modified(|published| {
                    if *published == current {
                        return false;
                    }
                    info!(
                        from = published.label(),
                        to = current.label(),
                        interval_secs = current.interval_seconds(),
                        "poll tier changed"
                    );
                    *published = current;
                    true
                });

                let status = snapshots.borrow().to_status(current);
                // no subscribers is fine
                let _ = reports.send(status);
            }
        }
    }

    info!("render loop stopped");
}
