use meterchain_crypto::HasherError;

use crate::config::ConfigError;
use crate::validation::IntegrityError;

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("integrity violation at {0}")]
    IntegrityViolation(#[from] IntegrityError),

    #[error("hash error: {0}")]
    Hash(#[from] HasherError),

    #[error("cannot build a ledger from an empty chain")]
    EmptyChain,

    #[error("ledger lock poisoned")]
    LockPoisoned,
}
