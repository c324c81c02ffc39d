use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use meterchain_crypto::Difficulty;
use meterchain_types::{Payload, Record};

use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::traits::{LedgerReader, LedgerWriter};

/// Cloneable handle to one ledger shared between request handlers.
///
/// Mining holds the write lock for its whole read-tail/search/append span, so
/// appends are serialized and readers never observe a partial append.
/// Validations and listings share the read lock and may run in parallel.
#[derive(Clone, Debug)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
    difficulty: Difficulty,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        let difficulty = ledger.difficulty();
        Self {
            inner: Arc::new(RwLock::new(ledger)),
            difficulty,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Ledger>, LedgerError> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Ledger>, LedgerError> {
        self.inner.write().map_err(|_| LedgerError::LockPoisoned)
    }
}

impl From<Ledger> for SharedLedger {
    fn from(ledger: Ledger) -> Self {
        Self::new(ledger)
    }
}

impl LedgerWriter for SharedLedger {
    fn mine(&self, payload: Payload) -> Result<Record, LedgerError> {
        self.write()?.mine(payload)
    }

    fn mine_checked(&self, payload: Payload) -> Result<Record, LedgerError> {
        self.write()?.mine_checked(payload)
    }
}

impl LedgerReader for SharedLedger {
    fn records(&self) -> Result<Vec<Record>, LedgerError> {
        Ok(self.read()?.records().to_vec())
    }

    fn get(&self, position: u64) -> Result<Option<Record>, LedgerError> {
        Ok(self.read()?.get(position).cloned())
    }

    fn len(&self) -> Result<usize, LedgerError> {
        Ok(self.read()?.len())
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn readings_for(&self, source_id: &str) -> Result<Vec<Record>, LedgerError> {
        Ok(self.read()?.readings_for(source_id).cloned().collect())
    }

    fn verify(&self) -> Result<(), LedgerError> {
        Ok(self.read()?.verify()?)
    }

    fn verified_records(&self) -> Result<Vec<Record>, LedgerError> {
        let ledger = self.read()?;
        ledger.verify()?;
        Ok(ledger.records().to_vec())
    }
}
