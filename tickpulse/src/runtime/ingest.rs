use crate::{
    audio::AudioCommand,
    clock::Clock,
    monitor::{AdminCommand, MomentumMonitor, MonitorSnapshot},
    settings::Settings,
};
use smol_str::SmolStr;
use std::sync::Arc;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// Raw price text for a symbol, as delivered by a tick source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    pub symbol: SmolStr,
    pub price: String,
}

impl Tick {
    pub fn new(symbol: impl Into<SmolStr>, price: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            price: price.into(),
        }
    }
}

/// Channel ends of a running ingestion task.
#[derive(Debug)]
pub struct IngestHandle {
    pub ticks: mpsc::Sender<Tick>,
    pub admin: mpsc::Sender<AdminCommand>,
    pub snapshots: watch::Receiver<Arc<MonitorSnapshot>>,
    /// Newest tone command, `None` until the first one.
    pub audio: watch::Receiver<Option<AudioCommand>>,
    /// Newest settings to persist, `None` until the first change.
    pub saves: watch::Receiver<Option<Settings>>,
    pub task: JoinHandle<()>,
}

/// Spawn the task that owns `monitor`.
///
/// It is the only writer: ticks and admin commands arrive over bounded channels and a fresh
/// snapshot is published after each one. Tone commands and settings saves are published the
/// same way, so a slow reader only ever misses superseded values. The task ends once both input
/// senders are dropped.
pub fn spawn_ingest(
    monitor: MomentumMonitor,
    clock: Arc<dyn Clock>,
    buffer_size: usize,
) -> IngestHandle {
    let buffer_size = buffer_size.max(1);
    let (tick_tx, tick_rx) = mpsc::channel(buffer_size);
    let (admin_tx, admin_rx) = mpsc::channel(buffer_size);
    let (audio_tx, audio_rx) = watch::channel(None);
    let (save_tx, save_rx) = watch::channel(None);
    let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(monitor.snapshot()));

    let task = tokio::spawn(run_ingest(
        monitor,
        clock,
        tick_rx,
        admin_rx,
        snapshot_tx,
        audio_tx,
        save_tx,
    ));

    IngestHandle {
        ticks: tick_tx,
        admin: admin_tx,
        snapshots: snapshot_rx,
        audio: audio_rx,
        saves: save_rx,
        task,
    }
}

async fn run_ingest(
    mut monitor: MomentumMonitor,
    clock: Arc<dyn Clock>,
    mut ticks: mpsc::Receiver<Tick>,
    mut admin: mpsc::Receiver<AdminCommand>,
    snapshots: watch::Sender<Arc<MonitorSnapshot>>,
    audio: watch::Sender<Option<AudioCommand>>,
    saves: watch::Sender<Option<Settings>>,
) {
    info!(symbol = %monitor.settings().symbol, "ingestion started");

    loop {
        let command = tokio::select! {
            Some(tick) = ticks.recv() => {
                if tick.symbol != monitor.settings().symbol {
                    debug!(
                        tick = %tick.symbol,
                        active = %monitor.settings().symbol,
                        "dropping tick for inactive symbol"
                    );
                    continue;
                }
                match monitor.ingest(&tick.price, clock.as_ref()) {
                    Ok(outcome) => outcome.command,
                    Err(error) => {
                        warn!(%error, symbol = %tick.symbol, raw = %tick.price, "rejected tick");
                        continue;
                    }
                }
            }
            Some(command) = admin.recv() => {
                debug!(?command, "admin command");
                monitor.apply(command, clock.as_ref())
            }
            else => break,
        };

        if let Some(command) = command {
            audio.send_replace(Some(command));
        }

        if let Some(settings) = monitor.take_save_needed() {
            saves.send_replace(Some(settings));
        }

        snapshots.send_replace(Arc::new(monitor.snapshot()));
    }

    info!("ingestion stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{audio::TonePattern, clock::ManualClock, momentum::EventKind};

    fn spawn(clock: &ManualClock) -> IngestHandle {
        spawn_ingest(MomentumMonitor::default(), Arc::new(clock.clone()), 8)
    }

    #[tokio::test]
    async fn test_ticks_publish_snapshots_and_tones() {
        let clock = ManualClock::at(2024, 1, 8, 9, 45, 0);
        let mut handle = spawn(&clock);

        handle.ticks.send(Tick::new("SPY", "500.00")).await.unwrap();
        handle.ticks.send(Tick::new("SPY", "501.00")).await.unwrap();

        let command = *handle.audio.wait_for(Option::is_some).await.unwrap();
        let command = command.unwrap();
        assert_eq!(command.pattern, TonePattern::Solid);
        assert_eq!(command.duration_ms, 200);

        let snapshot = handle
            .snapshots
            .wait_for(|s| s.ticks == 2)
            .await
            .unwrap()
            .clone();
        assert_eq!(snapshot.price, Some(501.0));
        assert_eq!(snapshot.alerts[0].kind, EventKind::BullBreak);
    }

    #[tokio::test]
    async fn test_inactive_symbol_and_invalid_ticks_are_dropped() {
        let clock = ManualClock::at(2024, 1, 8, 11, 0, 0);
        let mut handle = spawn(&clock);

        handle.ticks.send(Tick::new("QQQ", "400")).await.unwrap();
        handle.ticks.send(Tick::new("SPY", "nope")).await.unwrap();
        handle.ticks.send(Tick::new("SPY", "500")).await.unwrap();

        let snapshot = handle
            .snapshots
            .wait_for(|s| s.price.is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(snapshot.ticks, 1);
        assert_eq!(snapshot.price, Some(500.0));
    }

    #[tokio::test]
    async fn test_admin_commands_forward_saves() {
        let clock = ManualClock::at(2024, 1, 8, 11, 0, 0);
        let mut handle = spawn(&clock);

        handle
            .admin
            .send(AdminCommand::SetSymbol {
                symbol: "nvda".to_string(),
            })
            .await
            .unwrap();

        let saved = handle.saves.wait_for(Option::is_some).await.unwrap().clone();
        assert_eq!(saved.unwrap().symbol, "NVDA");

        handle.admin.send(AdminCommand::ToggleMute).await.unwrap();
        let saved = handle
            .saves
            .wait_for(|s| s.as_ref().is_some_and(|s| s.muted))
            .await
            .unwrap()
            .clone();
        assert_eq!(saved.unwrap().symbol, "NVDA");
    }

    #[tokio::test]
    async fn test_unread_tone_is_replaced_by_newer() {
        let clock = ManualClock::at(2024, 1, 8, 11, 0, 0);
        let mut handle = spawn_ingest(MomentumMonitor::default(), Arc::new(clock.clone()), 1);

        handle
            .admin
            .send(AdminCommand::TestAlert {
                kind: EventKind::BullBreak,
            })
            .await
            .unwrap();
        handle
            .admin
            .send(AdminCommand::TestAlert {
                kind: EventKind::BearDump,
            })
            .await
            .unwrap();
        handle
            .snapshots
            .wait_for(|s| s.alerts.len() == 2)
            .await
            .unwrap();

        let command = (*handle.audio.borrow()).unwrap();
        assert_eq!(command.pattern, TonePattern::Stutter);
    }

    #[tokio::test]
    async fn test_unread_save_is_replaced_by_newer() {
        let clock = ManualClock::at(2024, 1, 8, 11, 0, 0);
        let mut handle = spawn_ingest(MomentumMonitor::default(), Arc::new(clock.clone()), 1);

        handle
            .admin
            .send(AdminCommand::SetSymbol {
                symbol: "nvda".to_string(),
            })
            .await
            .unwrap();
        handle.admin.send(AdminCommand::ToggleMute).await.unwrap();
        handle.snapshots.wait_for(|s| s.muted).await.unwrap();

        let saved = handle.saves.borrow().clone().unwrap();
        assert_eq!(saved.symbol, "NVDA");
        assert!(saved.muted);
    }

    #[tokio::test]
    async fn test_task_stops_when_inputs_close() {
        let clock = ManualClock::at(2024, 1, 8, 11, 0, 0);
        let IngestHandle {
            ticks,
            admin,
            mut audio,
            task,
            ..
        } = spawn(&clock);

        drop(ticks);
        drop(admin);

        task.await.unwrap();
        assert!(audio.changed().await.is_err());
    }
}
