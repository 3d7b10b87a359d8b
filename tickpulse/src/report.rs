//! JSON shapes handed to the reporting sink.

use crate::{
    alert_log::AlertEvent, momentum::EventKind, monitor::MonitorSnapshot, schedule::PollTier,
};
use serde::Serialize;
use smol_str::SmolStr;

/// Dashboard report: `{"price","diff","alerts":[{"t","e","v"}],"history":[..]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// 2 decimals
    pub price: f64,
    /// 3 decimals
    pub diff: f64,
    /// Most recent first, empty slots omitted
    pub alerts: Vec<ReportAlert>,
    /// Oldest to newest, 2 decimals, unwritten slots as `0.0`
    pub history: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportAlert {
    pub t: String,
    pub e: EventKind,
    pub v: f64,
}

impl From<&AlertEvent> for ReportAlert {
    fn from(event: &AlertEvent) -> Self {
        Self {
            t: event.timestamp.clone(),
            e: event.kind,
            v: round_to(event.value, 2),
        }
    }
}

/// Extended report for operator clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub symbol: SmolStr,
    pub muted: bool,
    pub chop_limit: f64,
    pub tier: PollTier,
    pub interval_secs: u64,
    #[serde(flatten)]
    pub report: Report,
}

impl MonitorSnapshot {
    pub fn to_report(&self) -> Report {
        Report {
            price: round_to(self.price.unwrap_or_default(), 2),
            diff: round_to(self.diff, 3),
            alerts: self.alerts.iter().map(ReportAlert::from).collect(),
            history: self.history.iter().map(|v| round_to(*v, 2)).collect(),
        }
    }

    pub fn to_status(&self, tier: PollTier) -> StatusReport {
        StatusReport {
            kind: "status",
            symbol: self.symbol.clone(),
            muted: self.muted,
            chop_limit: self.profile.chop_limit,
            tier,
            interval_secs: tier.interval_seconds(),
            report: self.to_report(),
        }
    }
}

/// Round half away from zero to `decimals` places; non-finite values become `0.0`.
fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let scale = 10f64.powi(decimals);
    let rounded = (value * scale).round() / scale;
    // avoid serialising -0.0
    if rounded == 0.0 { 0.0 } else { rounded }
}
