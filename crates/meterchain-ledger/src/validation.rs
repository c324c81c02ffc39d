use std::fmt;

use meterchain_crypto::{ContentHasher, ProofOfWork};
use meterchain_types::Record;

/// The first integrity failure found in a chain.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("position {position}: {kind}")]
pub struct IntegrityError {
    pub position: u64,
    pub kind: IntegrityErrorKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntegrityErrorKind {
    /// The record sits at an index that does not match its stored position.
    PositionGap { expected: u64 },
    /// `link_hash` differs from the recomputed hash of the predecessor.
    BrokenLink,
    /// The stored proof does not satisfy the difficulty predicate.
    ProofRejected,
    /// The predecessor could not be canonically encoded.
    Unhashable(String),
}

impl fmt::Display for IntegrityErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PositionGap { expected } => write!(f, "expected position {expected}"),
            Self::BrokenLink => write!(f, "link hash does not match previous record"),
            Self::ProofRejected => write!(f, "proof does not satisfy difficulty"),
            Self::Unhashable(reason) => write!(f, "previous record cannot be hashed: {reason}"),
        }
    }
}

impl IntegrityErrorKind {
    /// Short machine-readable tag.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PositionGap { .. } => "position_gap",
            Self::BrokenLink => "broken_link",
            Self::ProofRejected => "proof_rejected",
            Self::Unhashable(_) => "unhashable",
        }
    }
}

/// Chain integrity verifier.
///
/// Walks a record sequence pairwise and, for every `(prev, next)`:
/// 1. `next` sits at the position its index implies
/// 2. `next.link_hash` equals the recomputed content hash of `prev`
/// 3. `next.proof` satisfies the difficulty against `prev.proof`
///
/// Stored hashes and proofs are never trusted; both are recomputed. The walk
/// stops at the first failure.
pub struct ChainVerifier;

impl ChainVerifier {
    pub fn verify(records: &[Record], pow: &ProofOfWork) -> Result<(), IntegrityError> {
        let Some(genesis) = records.first() else {
            return Ok(());
        };
        if !genesis.is_genesis() {
            return Err(IntegrityError {
                position: genesis.position(),
                kind: IntegrityErrorKind::PositionGap { expected: 0 },
            });
        }

        for (index, pair) in records.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            let expected = index as u64 + 1;
            Self::verify_pair(prev, next, expected, pow)?;
        }
        Ok(())
    }

    /// Check a single adjacent pair.
    pub fn verify_pair(
        prev: &Record,
        next: &Record,
        expected_position: u64,
        pow: &ProofOfWork,
    ) -> Result<(), IntegrityError> {
        let fail = |kind| IntegrityError {
            position: next.position(),
            kind,
        };

        if next.position() != expected_position {
            return Err(fail(IntegrityErrorKind::PositionGap {
                expected: expected_position,
            }));
        }

        let linked = ContentHasher::verify_record(prev, next.link_hash())
            .map_err(|e| fail(IntegrityErrorKind::Unhashable(e.to_string())))?;
        if !linked {
            return Err(fail(IntegrityErrorKind::BrokenLink));
        }

        if !pow.check(next.proof(), prev.proof(), next.position(), next.payload()) {
            return Err(fail(IntegrityErrorKind::ProofRejected));
        }
        Ok(())
    }
}
