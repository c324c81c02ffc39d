use meterchain_types::{Record, TypeError};
use sha2::{Digest, Sha256};

/// SHA-256 content hasher producing lowercase hex digests.
///
/// Record hashes are taken over [`Record::canonical_bytes`], so any verifier
/// with the same encoding recomputes the same link.
pub struct ContentHasher;

impl ContentHasher {
    /// Hex SHA-256 of raw bytes.
    pub fn hash_hex(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    /// Content hash of a record, as stored in its successor's link.
    pub fn hash_record(record: &Record) -> Result<String, HasherError> {
        let bytes = record.canonical_bytes()?;
        Ok(Self::hash_hex(&bytes))
    }

    /// Verify that a record hashes to the expected link value.
    pub fn verify_record(record: &Record, expected: &str) -> Result<bool, HasherError> {
        Ok(Self::hash_record(record)? == expected)
    }
}

/// Errors from hashing operations.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("record cannot be canonically encoded: {0}")]
    Encoding(#[from] TypeError),
}

#[cfg(test)]
mod tests {
    use meterchain_types::Payload;

    use super::*;

    #[test]
    fn known_vector() {
        assert_eq!(
            ContentHasher::hash_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hash_is_fixed_length_hex() {
        let h = ContentHasher::hash_hex(b"");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn record_hash_is_deterministic() {
        let r = Record::genesis();
        assert_eq!(
            ContentHasher::hash_record(&r).unwrap(),
            ContentHasher::hash_record(&r).unwrap()
        );
    }

    #[test]
    fn record_hash_matches_canonical_bytes() {
        let r = Record::new(2, Payload::opaque("x"), 5, "0");
        let expected = ContentHasher::hash_hex(&r.canonical_bytes().unwrap());
        assert!(ContentHasher::verify_record(&r, &expected).unwrap());
        assert!(!ContentHasher::verify_record(&r, "0").unwrap());
    }

    #[test]
    fn unencodable_record_is_an_error() {
        let bad = Record::new(
            1,
            Payload::Reading {
                source_id: "m".into(),
                quantity: f64::NAN,
            },
            1,
            "0",
        );
        assert!(matches!(
            ContentHasher::hash_record(&bad),
            Err(HasherError::Encoding(_))
        ));
    }
}
