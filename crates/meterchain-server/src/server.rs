use std::sync::Arc;

use meterchain_ledger::{Ledger, SharedLedger};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;
use crate::sink::{open_sink, RecordSink};

/// meterchain HTTP server owning one ledger.
pub struct MeterchainServer {
    config: ServerConfig,
    state: AppState,
}

impl MeterchainServer {
    /// Build the ledger and sink described by `config`.
    ///
    /// An invalid difficulty fails here, before anything is served. The
    /// genesis record is handed to the sink so its export is a whole chain.
    pub async fn from_config(config: ServerConfig) -> ServerResult<Self> {
        let ledger = Ledger::new(&config.ledger)?;
        let sink = open_sink(&config.sink).await?;
        sink.record_mined(ledger.tail()).await?;
        Ok(Self::with_parts(config, SharedLedger::new(ledger), sink))
    }

    pub fn with_parts(
        config: ServerConfig,
        ledger: SharedLedger,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        Self {
            config,
            state: AppState::new(ledger, sink),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn ledger(&self) -> &SharedLedger {
        &self.state.ledger
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = build_router(self.state);
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            bind = %self.config.bind_addr,
            difficulty = self.config.ledger.difficulty,
            "meterchain server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
