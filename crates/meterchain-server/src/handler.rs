use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use meterchain_ledger::{LedgerError, LedgerReader, LedgerWriter, SharedLedger};
use meterchain_types::{Payload, Record};
use tokio::sync::Mutex;
use tokio::task;
use tracing::{info, warn};

use crate::api::{
    AmendRequest, AmendResponse, ChainResponse, HealthResponse, InfoResponse, MineResponse,
    ReadingsResponse, ValidateResponse, SERVICE_NAME,
};
use crate::error::{ServerError, ServerResult};
use crate::sink::RecordSink;

/// Shared handler state: the one ledger plus the export sink.
///
/// Mines that go through [`AppState::mine_and_export`] reach the sink in
/// ledger order. After the first sink failure the export has a gap, so no
/// further records are sent to it.
#[derive(Clone)]
pub struct AppState {
    pub ledger: SharedLedger,
    pub sink: Arc<dyn RecordSink>,
    export_order: Arc<Mutex<()>>,
    export_failed: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(ledger: SharedLedger, sink: Arc<dyn RecordSink>) -> Self {
        Self {
            ledger,
            sink,
            export_order: Arc::new(Mutex::new(())),
            export_failed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// `false` once a sink write has failed.
    pub fn export_healthy(&self) -> bool {
        !self.export_failed.load(Ordering::Acquire)
    }

    /// Mine a record and hand it to the sink as one step.
    ///
    /// Runs on its own task so a dropped request cannot leave a mined record
    /// unexported. Returns the record and whether the sink accepted it.
    pub async fn mine_and_export(&self, payload: Payload) -> ServerResult<(Record, bool)> {
        let state = self.clone();
        tokio::spawn(async move {
            let _order = state.export_order.lock().await;
            let ledger = state.ledger.clone();
            let record = blocking(move || ledger.mine_checked(payload)).await?;
            let exported = state.export(&record).await;
            Ok::<_, ServerError>((record, exported))
        })
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?
    }

    async fn export(&self, record: &Record) -> bool {
        if !self.export_healthy() {
            return false;
        }
        match self.sink.record_mined(record).await {
            Ok(()) => true,
            Err(err) => {
                self.export_failed.store(true, Ordering::Release);
                warn!(
                    position = record.position(),
                    %err,
                    "record sink failed, export stopped"
                );
                false
            }
        }
    }
}

/// Run a ledger call on the blocking pool; mining is CPU-bound.
async fn blocking<T, F>(f: F) -> ServerResult<T>
where
    F: FnOnce() -> Result<T, LedgerError> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?
        .map_err(ServerError::from)
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> ServerResult<Json<InfoResponse>> {
    Ok(Json(InfoResponse {
        name: SERVICE_NAME.into(),
        version: env!("CARGO_PKG_VERSION").into(),
        difficulty: state.ledger.difficulty().get(),
        length: state.ledger.len()?,
        export_healthy: state.export_healthy(),
    }))
}

/// Mine a new record. Refused with 400 while the chain fails validation.
pub async fn mine_handler(
    State(state): State<AppState>,
    Json(payload): Json<Payload>,
) -> ServerResult<(StatusCode, Json<MineResponse>)> {
    payload.validate()?;
    let (record, exported) = state.mine_and_export(payload).await?;
    info!(position = record.position(), exported, "mine request served");

    Ok((
        StatusCode::CREATED,
        Json(MineResponse {
            message: "record mined".into(),
            record,
            exported,
        }),
    ))
}

/// Full chain, refused with 400 while the chain fails validation.
pub async fn list_handler(State(state): State<AppState>) -> ServerResult<Json<ChainResponse>> {
    let ledger = state.ledger.clone();
    let chain = blocking(move || ledger.verified_records()).await?;
    Ok(Json(ChainResponse {
        length: chain.len(),
        chain,
    }))
}

pub async fn get_handler(
    State(state): State<AppState>,
    Path(position): Path<u64>,
) -> ServerResult<Json<Record>> {
    let record = state
        .ledger
        .get(position)?
        .ok_or(ServerError::RecordNotFound(position))?;
    Ok(Json(record))
}

/// Attempted edit of a stored reading. Records never change: the request only
/// succeeds when it asks for the value already stored.
pub async fn amend_handler(
    State(state): State<AppState>,
    Path(position): Path<u64>,
    Json(body): Json<AmendRequest>,
) -> ServerResult<Json<AmendResponse>> {
    let record = state
        .ledger
        .get(position)?
        .ok_or(ServerError::RecordNotFound(position))?;
    if record.payload().quantity() != Some(body.quantity) {
        warn!(position, "rejected attempt to modify a stored record");
        return Err(ServerError::Immutable(position));
    }
    Ok(Json(AmendResponse {
        message: format!("record {position} already holds this quantity"),
        record,
    }))
}

/// 200 with `valid: true`, or 400 naming the first failing position.
pub async fn validate_handler(State(state): State<AppState>) -> ServerResult<Response> {
    let ledger = state.ledger.clone();
    let (length, outcome) = task::spawn_blocking(move || -> Result<_, LedgerError> {
        Ok((ledger.len()?, ledger.verify()))
    })
    .await
    .map_err(|e| ServerError::Internal(e.to_string()))??;

    let response = match outcome {
        Ok(()) => (
            StatusCode::OK,
            Json(ValidateResponse {
                valid: true,
                length,
                position: None,
                reason: None,
                detail: None,
            }),
        ),
        Err(LedgerError::IntegrityViolation(err)) => (
            StatusCode::BAD_REQUEST,
            Json(ValidateResponse {
                valid: false,
                length,
                position: Some(err.position),
                reason: Some(err.kind.code().into()),
                detail: Some(err.to_string()),
            }),
        ),
        Err(other) => return Err(other.into()),
    };
    Ok(response.into_response())
}

/// Consumption history of one meter.
pub async fn readings_handler(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
) -> ServerResult<Json<ReadingsResponse>> {
    let readings = state.ledger.readings_for(&source_id)?;
    Ok(Json(ReadingsResponse {
        source_id,
        readings,
    }))
}
