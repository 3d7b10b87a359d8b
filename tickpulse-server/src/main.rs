use chrono::Utc;
use futures::{SinkExt, StreamExt};
use std::{io::ErrorKind, net::SocketAddr, sync::Arc};
use tickpulse::{
    AdminCommand, Clock, MomentumMonitor, MonitorSnapshot, PollTier, Settings, StatusReport,
    SystemClock, TickpulseConfig, TickpulseError,
    runtime::{
        IngestHandle, LogToneOutput, RenderLoop, run_render_loop, spawn_ingest, spawn_quote_poller,
    },
};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::{broadcast, mpsc, watch},
};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

const DEFAULT_ADDR: &str = "0.0.0.0:9101";

/// Channel ends shared by every client connection
#[derive(Clone)]
struct ClientContext {
    reports: broadcast::Sender<StatusReport>,
    admin: mpsc::Sender<AdminCommand>,
    snapshots: watch::Receiver<Arc<MonitorSnapshot>>,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    init_logging();

    let config = TickpulseConfig::from_env();
    info!(?config, "Starting tickpulse server");

    let settings = load_settings(&config.settings_path).await;
    info!(
        symbol = %settings.symbol,
        chop_limit = settings.profile.chop_limit,
        muted = settings.muted,
        "Loaded settings"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let initial_tier = PollTier::from(clock.local_time());

    let IngestHandle {
        ticks,
        admin,
        snapshots,
        audio,
        saves,
        task: ingest_task,
    } = spawn_ingest(
        MomentumMonitor::new(settings),
        clock.clone(),
        config.channel_buffer_size,
    );

    let (tier_tx, tier_rx) = watch::channel(initial_tier);
    let (report_tx, _report_rx) = broadcast::channel::<StatusReport>(config.channel_buffer_size);

    let render_task = tokio::spawn(run_render_loop(RenderLoop {
        clock,
        audio,
        snapshots: snapshots.clone(),
        tier: tier_tx,
        reports: report_tx.clone(),
        output: LogToneOutput::default(),
        render_interval: config.render_interval,
        report_interval: config.report_interval,
    }));

    let poller_task = spawn_quote_poller(config.clone(), snapshots.clone(), tier_rx, ticks);
    let saver_task = tokio::spawn(persist_settings(config.settings_path.clone(), saves));

    let addr = parse_addr(&config.report_addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(bind_err) => {
            let error = TickpulseError::Transport(format!("bind {addr}: {bind_err}"));
            error!(
                %error,
                recoverable = error.is_recoverable(),
                "Failed to start WebSocket server"
            );
            return;
        }
    };
    info!("WebSocket server listening on ws://{}", addr);

    let context = ClientContext {
        reports: report_tx,
        admin,
        snapshots,
    };

    tokio::select! {
        _ = accept_clients(listener, context) => {
            warn!("WebSocket listener stopped");
        }
        result = tokio::signal::ctrl_c() => {
            if let Err(error) = result {
                error!(%error, "Failed to listen for shutdown signal");
            }
            info!("Shutdown requested");
        }
    }

    // Client tasks hold admin senders, so the ingestion task is stopped directly. Its channel
    // ends close with it, which lets the render loop and the settings writer drain and exit.
    poller_task.abort();
    ingest_task.abort();
    if let Err(error) = render_task.await {
        warn!(%error, "Render loop ended abnormally");
    }
    if let Err(error) = saver_task.await {
        warn!(%error, "Settings writer ended abnormally");
    }

    info!("Tickpulse server stopped");
}

/// Accept WebSocket connections until the listener fails
async fn accept_clients(listener: TcpListener, context: ClientContext) {
    while let Ok((stream, peer_addr)) = listener.accept().await {
        info!("New WebSocket connection from {}", peer_addr);
        tokio::spawn(handle_client(stream, peer_addr, context.clone()));
    }
}

/// Handle individual WebSocket client connection
async fn handle_client(stream: TcpStream, peer_addr: SocketAddr, context: ClientContext) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("WebSocket handshake failed for {}: {}", peer_addr, e);
            return;
        }
    };

    info!("WebSocket handshake completed for {}", peer_addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let mut rx = context.reports.subscribe();

    let symbol = context.snapshots.borrow().symbol.clone();
    if let Ok(msg) = serde_json::to_string(&welcome_message(&symbol)) {
        let _ = ws_sender.send(Message::Text(msg.into())).await;
    }

    // Stream status reports to this client
    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(status) => {
                    if let Ok(json) = serde_json::to_string(&status) {
                        if ws_sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Reports are periodic snapshots, the next one supersedes what was missed
                    warn!("Client {} lagged, skipped {} reports", peer_addr, skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Report channel closed for {}", peer_addr);
                    break;
                }
            }
        }
    });

    // Admin commands from this client
    let admin = context.admin;
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Ok(Message::Ping(_)) => {
                    debug!("Received ping from {}", peer_addr);
                }
                Ok(Message::Text(text)) => match parse_admin(text.as_str()) {
                    Ok(command) => {
                        info!(?command, "Admin command from {}", peer_addr);
                        if admin.send(command).await.is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        warn!(%error, "Ignoring malformed admin message from {}", peer_addr);
                    }
                },
                Err(e) => {
                    error!("WebSocket error for {}: {}", peer_addr, e);
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    info!("WebSocket connection closed for {}", peer_addr);
}

fn welcome_message(symbol: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "welcome",
        "message": "Connected to tickpulse momentum feed",
        "symbol": symbol,
        "timestamp": Utc::now()
    })
}

fn parse_admin(text: &str) -> Result<AdminCommand, TickpulseError> {
    serde_json::from_str(text).map_err(|e| TickpulseError::Transport(format!("admin message: {e}")))
}

fn parse_addr(addr: &str) -> SocketAddr {
    addr.parse().unwrap_or_else(|_| {
        warn!(addr, "Invalid REPORT_ADDR, using {}", DEFAULT_ADDR);
        SocketAddr::from(([0, 0, 0, 0], 9101))
    })
}

/// Load persisted settings, falling back to defaults when absent or unusable
async fn load_settings(path: &str) -> Settings {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Settings::from_json(&text),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path, "No persisted settings, using defaults");
            Settings::default()
        }
        Err(e) => {
            warn!(path, error = %e, "Failed to read settings, using defaults");
            Settings::default()
        }
    }
}

/// Write settings to `path` whenever the monitor flags a change. Changes made while a write
/// is in flight collapse into one write of the newest settings.
async fn persist_settings(path: String, mut saves: watch::Receiver<Option<Settings>>) {
    while saves.changed().await.is_ok() {
        let Some(settings) = saves.borrow_and_update().clone() else {
            continue;
        };
        let json = match settings.to_json() {
            Ok(json) => json,
            Err(error) => {
                warn!(%error, "Failed to serialise settings");
                continue;
            }
        };

        match tokio::fs::write(&path, json).await {
            Ok(()) => info!(path = %path, symbol = %settings.symbol, "Settings saved"),
            Err(e) => warn!(path = %path, error = %e, "Failed to save settings"),
        }
    }
}

/// Initialize logging, `LOG_FORMAT=json` switches to structured output
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
