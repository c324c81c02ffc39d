//! Foundation types for meterchain.
//!
//! This crate defines the ledger entry and everything needed to hash it
//! reproducibly. Every other meterchain crate depends on `meterchain-types`.
//!
//! # Key Types
//!
//! - [`Payload`] — Data attached to a record: a meter reading or an opaque string
//! - [`Record`] — One immutable ledger entry
//! - [`canonical`] — Sorted-key JSON encoding used as hash input

pub mod canonical;
pub mod error;
pub mod payload;
pub mod record;

pub use error::TypeError;
pub use payload::Payload;
pub use record::{Record, GENESIS_LINK};
