//! Request and response bodies for the HTTP API.

use meterchain_types::Record;
use serde::{Deserialize, Serialize};

pub const SERVICE_NAME: &str = "meterchain-server";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub difficulty: u32,
    pub length: usize,
    /// `false` once the record sink has failed and stopped receiving records.
    pub export_healthy: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    pub record: Record,
    /// Whether the record sink received this record.
    pub exported: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainResponse {
    pub length: usize,
    pub chain: Vec<Record>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadingsResponse {
    pub source_id: String,
    pub readings: Vec<Record>,
}

/// Body of an attempted in-place edit of a reading.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AmendRequest {
    pub quantity: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AmendResponse {
    pub message: String,
    pub record: Record,
}
