use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use meterchain_ledger::{IntegrityError, LedgerError};
use meterchain_types::TypeError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("ledger integrity compromised: {0}")]
    ChainInvalid(IntegrityError),

    #[error("record not found at position {0}")]
    RecordNotFound(u64),

    #[error("record at position {0} is immutable")]
    Immutable(u64),

    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] TypeError),

    #[error("ledger error: {0}")]
    Ledger(LedgerError),

    #[error("sink error: {0}")]
    Sink(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl From<LedgerError> for ServerError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::IntegrityViolation(e) => Self::ChainInvalid(e),
            LedgerError::Config(e) => Self::Config(e.to_string()),
            other => Self::Ledger(other),
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ChainInvalid(_) | Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::RecordNotFound(_) => StatusCode::NOT_FOUND,
            Self::Immutable(_) => StatusCode::CONFLICT,
            Self::Ledger(_) | Self::Sink(_) | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
