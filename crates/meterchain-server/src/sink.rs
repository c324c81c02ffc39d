use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use meterchain_types::Record;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::config::SinkConfig;
use crate::error::{ServerError, ServerResult};

/// Receives the genesis record at startup and every record right after it is
/// mined.
///
/// Sinks export records; they are never read back into the ledger.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn record_mined(&self, record: &Record) -> ServerResult<()>;
}

pub struct NoOpSink;

#[async_trait]
impl RecordSink for NoOpSink {
    async fn record_mined(&self, _record: &Record) -> ServerResult<()> {
        Ok(())
    }
}

/// Writes one JSON object per line to a file.
///
/// The file holds exactly one ledger's records: it is truncated on open,
/// matching the lifetime of the in-process ledger.
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    /// Create (or truncate) the file.
    pub async fn open(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSink for JsonLinesSink {
    async fn record_mined(&self, record: &Record) -> ServerResult<()> {
        let mut line =
            serde_json::to_vec(record).map_err(|e| ServerError::Sink(e.to_string()))?;
        line.push(b'\n');
        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

/// Build the sink described by the configuration.
pub async fn open_sink(config: &SinkConfig) -> ServerResult<Arc<dyn RecordSink>> {
    match config {
        SinkConfig::None => Ok(Arc::new(NoOpSink)),
        SinkConfig::JsonLines { path } => Ok(Arc::new(JsonLinesSink::open(path).await?)),
    }
}
