//! Append-only proof-of-work ledger for meterchain.
//!
//! This crate is the heart of meterchain. It provides:
//! - `Ledger`: genesis, mining, and end-to-end integrity validation
//! - `SharedLedger`: single-writer, many-reader handle for services
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - `LedgerConfig`: difficulty configuration with environment loading
//! - `ChainVerifier`: pairwise link and proof re-checking

pub mod config;
pub mod error;
pub mod ledger;
pub mod shared;
pub mod traits;
pub mod validation;

pub use config::{ConfigError, LedgerConfig, DIFFICULTY_ENV};
pub use error::LedgerError;
pub use ledger::Ledger;
pub use shared::SharedLedger;
pub use traits::{LedgerReader, LedgerWriter};
pub use validation::{ChainVerifier, IntegrityError, IntegrityErrorKind};

pub use meterchain_crypto::Difficulty;
pub use meterchain_types::{Payload, Record, GENESIS_LINK};
