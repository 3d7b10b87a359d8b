use super::ingest::Tick;
use crate::{
    error::TickpulseError, monitor::MonitorSnapshot, schedule::PollTier, settings::TickpulseConfig,
};
use reqwest::Client;
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// Quote endpoint response. Only the price is read; it may arrive as text or as a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuoteResponse {
    #[serde(alias = "last", alias = "c")]
    pub price: RawPrice,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawPrice {
    Text(String),
    Number(f64),
}

impl RawPrice {
    /// Price text as handed to the momentum engine, which does its own validation.
    pub fn into_text(self) -> String {
        match self {
            RawPrice::Text(text) => text,
            RawPrice::Number(value) => value.to_string(),
        }
    }
}

/// Poll the quote endpoint for the active symbol, pacing requests by the published
/// [`PollTier`].
///
/// Request failures are logged and retried at the next interval. The poller stops when the
/// tick receiver is dropped.
pub fn spawn_quote_poller(
    config: TickpulseConfig,
    snapshots: watch::Receiver<Arc<MonitorSnapshot>>,
    tier: watch::Receiver<PollTier>,
    ticks: mpsc::Sender<Tick>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = Client::new();
        info!(url = %config.quote_url, "quote poller started");

        loop {
            let symbol = snapshots.borrow().symbol.clone();
            let url = config.quote_url_for(&symbol);

            match fetch_quote(&client, &url).await {
                Ok(price) => {
                    debug!(%symbol, %price, "quote");
                    if ticks.send(Tick::new(symbol, price)).await.is_err() {
                        break;
                    }
                }
                Err(error) => warn!(%symbol, %error, "quote poll failed"),
            }

            let wait = Duration::from_secs(tier.borrow().interval_seconds());
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = ticks.closed() => break,
            }
        }

        info!("quote poller stopped");
    })
}

/// Fetch the latest price text from `url`.
pub async fn fetch_quote(client: &Client, url: &str) -> Result<String, TickpulseError> {
    let response = client.get(url).send().await?.error_for_status()?;
    let quote = response.json::<QuoteResponse>().await?;
    Ok(quote.price.into_text())
}
