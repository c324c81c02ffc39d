use meterchain_crypto::Difficulty;
use meterchain_types::{Payload, Record};

use crate::error::LedgerError;

/// Write boundary for ledger append operations.
pub trait LedgerWriter: Send + Sync {
    /// Append one record. Appends never interleave.
    fn mine(&self, payload: Payload) -> Result<Record, LedgerError>;

    /// Append only if the chain validates, checked under the same exclusion
    /// as the append itself.
    fn mine_checked(&self, payload: Payload) -> Result<Record, LedgerError>;
}

/// Read boundary for ledger query and validation operations.
pub trait LedgerReader: Send + Sync {
    /// Snapshot of every record in order.
    fn records(&self) -> Result<Vec<Record>, LedgerError>;

    fn get(&self, position: u64) -> Result<Option<Record>, LedgerError>;

    fn len(&self) -> Result<usize, LedgerError>;

    fn difficulty(&self) -> Difficulty;

    /// Readings reported by one meter, in ledger order.
    fn readings_for(&self, source_id: &str) -> Result<Vec<Record>, LedgerError>;

    /// Structured integrity check; integrity failures surface as
    /// [`LedgerError::IntegrityViolation`].
    fn verify(&self) -> Result<(), LedgerError>;

    /// Snapshot of every record, taken only if the chain verifies. The check
    /// and the snapshot see the same records.
    fn verified_records(&self) -> Result<Vec<Record>, LedgerError>;

    /// `Ok(false)` when the chain fails validation.
    fn validate(&self) -> Result<bool, LedgerError> {
        match self.verify() {
            Ok(()) => Ok(true),
            Err(LedgerError::IntegrityViolation(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
