//! Tokio tasks wiring the momentum monitor to its tick source, tone output and reports.
//!
//! The ingestion task is the only writer of [`crate::monitor::MomentumMonitor`]. Everything
//! else talks to it over channels: ticks and admin commands in, snapshots, tones and
//! settings saves out.

mod ingest;
mod poller;
mod render;

pub use ingest::{IngestHandle, Tick, spawn_ingest};
pub use poller::{QuoteResponse, RawPrice, fetch_quote, spawn_quote_poller};
pub use render::{LogToneOutput, RenderLoop, ToneOutput, run_render_loop};
