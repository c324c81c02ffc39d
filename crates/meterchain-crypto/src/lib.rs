//! Cryptographic primitives for meterchain.
//!
//! Provides SHA-256 content hashing of records and the proof-of-work search
//! that links each record to its predecessor.
//!
//! All crypto operations wrap established libraries — no custom cryptography.

pub mod hasher;
pub mod pow;

pub use hasher::{ContentHasher, HasherError};
pub use pow::{Difficulty, DifficultyError, ProofOfWork};
