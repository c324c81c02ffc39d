use std::fmt;

use meterchain_types::Payload;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Number of hex characters in a SHA-256 digest.
const DIGEST_HEX_LEN: u32 = 64;

/// Required count of leading `'0'` characters in a proof-of-work digest.
///
/// Always within `1..=64`. Built once from configuration and never changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Difficulty(u32);

impl Difficulty {
    pub const DEFAULT: Self = Self(2);

    pub fn new(zeros: u32) -> Result<Self, DifficultyError> {
        if zeros == 0 || zeros > DIGEST_HEX_LEN {
            return Err(DifficultyError::OutOfRange(zeros));
        }
        Ok(Self(zeros))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Returns `true` if the hex digest starts with enough zero characters.
    pub fn is_satisfied_by(self, digest: &str) -> bool {
        digest.len() >= self.0 as usize && digest.bytes().take(self.0 as usize).all(|b| b == b'0')
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Difficulty {
    type Error = DifficultyError;

    fn try_from(zeros: u32) -> Result<Self, Self::Error> {
        Self::new(zeros)
    }
}

impl From<Difficulty> for u32 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors from difficulty construction.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DifficultyError {
    #[error("difficulty must be between 1 and 64, got {0}")]
    OutOfRange(u32),
}

/// Brute-force proof-of-work over SHA-256.
///
/// A proof `p` is valid for a record at `position` following a record with
/// proof `q` when `sha256(str(p² - q² + position) + fragment)` starts with
/// the difficulty prefix, where `fragment` is the payload's
/// [`Payload::digest_fragment`]. The arithmetic is signed and never wraps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: Difficulty,
}

impl ProofOfWork {
    pub fn new(difficulty: Difficulty) -> Self {
        Self { difficulty }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// The string hashed for a candidate proof.
    ///
    /// Returns `None` if the squared terms overflow `i128`, which only a
    /// forged proof close to `u64::MAX` can cause.
    pub fn digest_input(
        candidate: u64,
        previous: u64,
        position: u64,
        fragment: &str,
    ) -> Option<String> {
        let c = i128::from(candidate);
        let p = i128::from(previous);
        let value = c
            .checked_mul(c)?
            .checked_sub(p.checked_mul(p)?)?
            .checked_add(i128::from(position))?;
        Some(format!("{value}{fragment}"))
    }

    /// Hex SHA-256 of [`ProofOfWork::digest_input`].
    pub fn digest(candidate: u64, previous: u64, position: u64, fragment: &str) -> Option<String> {
        let input = Self::digest_input(candidate, previous, position, fragment)?;
        Some(hex::encode(Sha256::digest(input.as_bytes())))
    }

    /// Find the smallest proof `>= 1` satisfying the difficulty.
    ///
    /// Unbounded: the expected cost grows by a factor of 16 per difficulty step.
    pub fn search(&self, previous: u64, position: u64, payload: &Payload) -> u64 {
        let fragment = payload.digest_fragment();
        let mut candidate: u64 = 1;
        loop {
            if self.check_fragment(candidate, previous, position, &fragment) {
                debug!(
                    position,
                    proof = candidate,
                    difficulty = self.difficulty.get(),
                    "proof-of-work found"
                );
                return candidate;
            }
            candidate += 1;
        }
    }

    /// Re-check a stored proof against its predecessor's proof.
    pub fn check(&self, proof: u64, previous: u64, position: u64, payload: &Payload) -> bool {
        self.check_fragment(proof, previous, position, &payload.digest_fragment())
    }

    fn check_fragment(&self, proof: u64, previous: u64, position: u64, fragment: &str) -> bool {
        Self::digest(proof, previous, position, fragment)
            .is_some_and(|digest| self.difficulty.is_satisfied_by(&digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> Payload {
        Payload::reading("12345", 100.0).unwrap()
    }

    #[test]
    fn difficulty_bounds() {
        assert_eq!(Difficulty::new(0), Err(DifficultyError::OutOfRange(0)));
        assert_eq!(Difficulty::new(65), Err(DifficultyError::OutOfRange(65)));
        assert_eq!(Difficulty::new(1).unwrap().get(), 1);
        assert_eq!(Difficulty::new(64).unwrap().get(), 64);
        assert_eq!(Difficulty::default().get(), 2);
    }

    #[test]
    fn difficulty_prefix_predicate() {
        let d = Difficulty::new(3).unwrap();
        assert!(d.is_satisfied_by("000abc"));
        assert!(d.is_satisfied_by("0000"));
        assert!(!d.is_satisfied_by("00a000"));
        assert!(!d.is_satisfied_by("00"));
    }

    #[test]
    fn difficulty_serde_validates() {
        let d: Difficulty = serde_json::from_str("4").unwrap();
        assert_eq!(d.get(), 4);
        assert_eq!(serde_json::to_string(&d).unwrap(), "4");
        assert!(serde_json::from_str::<Difficulty>("0").is_err());
    }

    #[test]
    fn digest_input_formula() {
        assert_eq!(
            ProofOfWork::digest_input(3, 1, 1, "m1.5").as_deref(),
            Some("9m1.5")
        );
    }

    #[test]
    fn digest_input_can_be_negative() {
        // 1 - 100 + 2 = -97
        assert_eq!(
            ProofOfWork::digest_input(1, 10, 2, "x").as_deref(),
            Some("-97x")
        );
    }

    #[test]
    fn digest_input_overflow_is_none() {
        assert_eq!(ProofOfWork::digest_input(u64::MAX, 0, 0, ""), None);
        assert!(ProofOfWork::digest_input(u64::MAX / 2, 0, 0, "").is_some());
    }

    #[test]
    fn search_finds_valid_proof() {
        let pow = ProofOfWork::new(Difficulty::new(2).unwrap());
        let proof = pow.search(1, 1, &reading());
        assert!(proof >= 1);
        let digest = ProofOfWork::digest(proof, 1, 1, &reading().digest_fragment()).unwrap();
        assert!(digest.starts_with("00"));
        assert!(pow.check(proof, 1, 1, &reading()));
    }

    #[test]
    fn search_returns_smallest_proof() {
        let pow = ProofOfWork::new(Difficulty::new(2).unwrap());
        let proof = pow.search(1, 1, &reading());
        for smaller in 1..proof {
            assert!(!pow.check(smaller, 1, 1, &reading()));
        }
    }

    #[test]
    fn higher_difficulty_proof_satisfies_lower() {
        let hard = ProofOfWork::new(Difficulty::new(3).unwrap());
        let easy = ProofOfWork::new(Difficulty::new(1).unwrap());
        let proof = hard.search(5, 2, &reading());
        assert!(easy.check(proof, 5, 2, &reading()));
        assert!(easy.search(5, 2, &reading()) <= proof);
    }

    #[test]
    fn search_is_deterministic() {
        let pow = ProofOfWork::new(Difficulty::new(2).unwrap());
        let payload = Payload::opaque("determinism");
        assert_eq!(pow.search(7, 3, &payload), pow.search(7, 3, &payload));
    }
}
