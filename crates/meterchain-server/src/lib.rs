//! HTTP server for meterchain.
//!
//! Exposes one in-process ledger over JSON: mine readings, list and validate
//! the chain, and query per-meter history. Mined records are handed to a
//! configurable export sink.

pub mod api;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod sink;

pub use config::{ServerConfig, SinkConfig};
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use server::MeterchainServer;
pub use sink::{open_sink, JsonLinesSink, NoOpSink, RecordSink};
