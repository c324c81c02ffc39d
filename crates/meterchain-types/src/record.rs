use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical;
use crate::error::TypeError;
use crate::payload::Payload;

/// Link value stored in the genesis record, which has no predecessor.
pub const GENESIS_LINK: &str = "0";

/// Proof value stored in the genesis record.
pub const GENESIS_PROOF: u64 = 1;

/// Timestamp layout used inside the canonical encoding.
const CANONICAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One immutable ledger entry.
///
/// Fields are read-only once constructed. The external JSON shape is
/// `{"index", "timestamp", <payload fields>, "proof", "link_hash"}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "index")]
    position: u64,
    #[serde(rename = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(flatten)]
    payload: Payload,
    proof: u64,
    link_hash: String,
}

impl Record {
    /// Create a record stamped with the current time.
    pub fn new(position: u64, payload: Payload, proof: u64, link_hash: impl Into<String>) -> Self {
        Self::with_timestamp(position, Utc::now(), payload, proof, link_hash)
    }

    /// Create a record with an explicit timestamp, truncated to microseconds.
    pub fn with_timestamp(
        position: u64,
        created_at: DateTime<Utc>,
        payload: Payload,
        proof: u64,
        link_hash: impl Into<String>,
    ) -> Self {
        Self {
            position,
            created_at: created_at.trunc_subsecs(6),
            payload,
            proof,
            link_hash: link_hash.into(),
        }
    }

    /// The first record of every ledger: a zero reading from meter `"0"`.
    pub fn genesis() -> Self {
        let payload = Payload::Reading {
            source_id: "0".into(),
            quantity: 0.0,
        };
        Self::new(0, payload, GENESIS_PROOF, GENESIS_LINK)
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn proof(&self) -> u64 {
        self.proof
    }

    /// Hash of the preceding record, or [`GENESIS_LINK`].
    pub fn link_hash(&self) -> &str {
        &self.link_hash
    }

    pub fn is_genesis(&self) -> bool {
        self.position == 0
    }

    /// Canonical byte encoding of every field, used as content-hash input.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, TypeError> {
        let mut fields = BTreeMap::new();
        fields.insert("index", Value::from(self.position));
        fields.insert(
            "timestamp",
            Value::String(self.created_at.format(CANONICAL_TIME_FORMAT).to_string()),
        );
        fields.insert("proof", Value::from(self.proof));
        fields.insert("link_hash", Value::String(self.link_hash.clone()));
        self.payload.write_fields(&mut fields)?;
        canonical::to_vec(&fields)
    }
}
