//! Persisted user settings and process runtime configuration.
//!
//! [`Settings`] is what survives a restart (symbol, tuning, mute). The core only converts it
//! to and from JSON text; reading and writing the file belongs to the caller.
//! [`TickpulseConfig`] is read from environment variables at startup.

use crate::{error::TickpulseError, momentum::ThresholdProfile};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::time::Duration;
use tracing::warn;

/// Current settings schema version.
pub const SETTINGS_VERSION: u32 = 2;

/// Symbol used when nothing valid is persisted.
pub const DEFAULT_SYMBOL: &str = "SPY";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    pub version: u32,
    pub symbol: SmolStr,
    pub profile: ThresholdProfile,
    #[serde(default)]
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self::for_symbol(DEFAULT_SYMBOL)
    }
}

/// Only the version is read first, so that an older layout is detected even when the
/// rest of its fields no longer deserialise.
#[derive(Deserialize)]
struct VersionHeader {
    #[serde(default)]
    version: u32,
}

impl Settings {
    /// Fresh settings for `symbol` using its preset profile.
    pub fn for_symbol(symbol: &str) -> Self {
        Self {
            version: SETTINGS_VERSION,
            symbol: normalise_symbol(symbol),
            profile: ThresholdProfile::preset(symbol),
            muted: false,
        }
    }

    /// Strict parse: rejects unknown versions, malformed JSON and invalid profiles.
    pub fn try_from_json(text: &str) -> Result<Self, TickpulseError> {
        let header: VersionHeader = serde_json::from_str(text)?;
        if header.version != SETTINGS_VERSION {
            return Err(TickpulseError::ConfigMismatch {
                found: header.version,
                expected: SETTINGS_VERSION,
            });
        }

        let mut settings: Settings = serde_json::from_str(text)?;
        settings.profile.validate()?;
        settings.symbol = normalise_symbol(&settings.symbol);
        Ok(settings)
    }

    /// Lenient parse: anything unusable is treated as absent and replaced by defaults.
    pub fn from_json(text: &str) -> Self {
        match Self::try_from_json(text) {
            Ok(settings) => settings,
            Err(error) => {
                warn!(%error, "discarding persisted settings, using defaults");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String, TickpulseError> {
        serde_json::to_string_pretty(self).map_err(TickpulseError::from)
    }
}

pub(crate) fn normalise_symbol(symbol: &str) -> SmolStr {
    SmolStr::new(symbol.trim().to_ascii_uppercase())
}

/// Get a value from the environment, falling back to `default` when unset or unparsable
fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Shortest render or report period, `tokio::time::interval` rejects zero
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Process runtime configuration
#[derive(Debug, Clone)]
pub struct TickpulseConfig {
    /// Quote endpoint, `{symbol}` is substituted with the active symbol
    pub quote_url: String,
    /// Address the report/admin WebSocket listens on
    pub report_addr: String,
    /// Where persisted [`Settings`] live
    pub settings_path: String,
    /// How often the render loop polls the tone sequencer
    pub render_interval: Duration,
    /// How often a report is pushed to clients
    pub report_interval: Duration,
    /// Capacity of the bounded channels between tasks
    pub channel_buffer_size: usize,
}

impl Default for TickpulseConfig {
    fn default() -> Self {
        Self {
            quote_url: "http://127.0.0.1:8080/quote/{symbol}".to_string(),
            report_addr: "0.0.0.0:9101".to_string(),
            settings_path: "tickpulse.json".to_string(),
            render_interval: Duration::from_millis(10),
            report_interval: Duration::from_millis(1_000),
            channel_buffer_size: 256,
        }
    }
}

impl TickpulseConfig {
    /// Read `QUOTE_URL`, `REPORT_ADDR`, `SETTINGS_PATH`, `RENDER_INTERVAL_MS`,
    /// `REPORT_INTERVAL_MS` and `CHANNEL_BUFFER_SIZE`.
    ///
    /// Zero intervals and a zero buffer size are raised to their minimum.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let buffer_size = defaults.channel_buffer_size;
        Self {
            quote_url: env_or("QUOTE_URL", defaults.quote_url),
            report_addr: env_or("REPORT_ADDR", defaults.report_addr),
            settings_path: env_or("SETTINGS_PATH", defaults.settings_path),
            ..defaults
        }
        .with_render_interval(Duration::from_millis(env_or("RENDER_INTERVAL_MS", 10)))
        .with_report_interval(Duration::from_millis(env_or("REPORT_INTERVAL_MS", 1_000)))
        .with_channel_buffer_size(env_or("CHANNEL_BUFFER_SIZE", buffer_size))
    }

    pub fn with_quote_url(mut self, url: impl Into<String>) -> Self {
        self.quote_url = url.into();
        self
    }

    pub fn with_render_interval(mut self, interval: Duration) -> Self {
        self.render_interval = interval.max(MIN_INTERVAL);
        self
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval.max(MIN_INTERVAL);
        self
    }

    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size.max(1);
        self
    }

    /// Quote URL for `symbol`
    pub fn quote_url_for(&self, symbol: &str) -> String {
        self.quote_url.replace("{symbol}", symbol)
    }
}
