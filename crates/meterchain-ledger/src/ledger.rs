use meterchain_crypto::{ContentHasher, Difficulty, ProofOfWork};
use meterchain_types::{Payload, Record};
use tracing::{info, warn};

use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::validation::{ChainVerifier, IntegrityError};

/// Append-only sequence of proof-of-work linked records.
///
/// A ledger always holds at least its genesis record. Records are only ever
/// added by [`Ledger::mine`]; nothing already stored is modified.
#[derive(Clone, Debug)]
pub struct Ledger {
    records: Vec<Record>,
    pow: ProofOfWork,
}

impl Ledger {
    /// Build a fresh ledger with a genesis record.
    ///
    /// Fails if the configured difficulty is out of range.
    pub fn new(config: &LedgerConfig) -> Result<Self, LedgerError> {
        Ok(Self::with_difficulty(config.difficulty()?))
    }

    pub fn with_difficulty(difficulty: Difficulty) -> Self {
        Self {
            records: vec![Record::genesis()],
            pow: ProofOfWork::new(difficulty),
        }
    }

    /// Adopt a previously exported chain as-is.
    ///
    /// The records are not verified here; call [`Ledger::verify`] afterwards.
    pub fn from_records(records: Vec<Record>, difficulty: Difficulty) -> Result<Self, LedgerError> {
        if records.is_empty() {
            return Err(LedgerError::EmptyChain);
        }
        Ok(Self {
            records,
            pow: ProofOfWork::new(difficulty),
        })
    }

    pub fn difficulty(&self) -> Difficulty {
        self.pow.difficulty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recently appended record.
    pub fn tail(&self) -> &Record {
        // Non-empty by construction.
        &self.records[self.records.len() - 1]
    }

    pub fn get(&self, position: u64) -> Option<&Record> {
        usize::try_from(position)
            .ok()
            .and_then(|index| self.records.get(index))
    }

    /// Readings reported by one meter, in ledger order.
    pub fn readings_for<'a>(&'a self, source_id: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records
            .iter()
            .filter(move |r| r.payload().source_id() == Some(source_id))
    }

    /// Append one record carrying `payload`.
    ///
    /// Links to the current tail, searches for the smallest valid proof, and
    /// returns a copy of the stored record. The chain is not re-validated
    /// after the append.
    pub fn mine(&mut self, payload: Payload) -> Result<Record, LedgerError> {
        let tail = self.tail();
        let link_hash = ContentHasher::hash_record(tail)?;
        let previous_proof = tail.proof();
        let position = self.records.len() as u64;

        let proof = self.pow.search(previous_proof, position, &payload);
        let record = Record::new(position, payload, proof, link_hash);
        info!(position, proof, link = %record.link_hash(), "record mined");

        self.records.push(record.clone());
        Ok(record)
    }

    /// Mine only if the chain currently validates.
    pub fn mine_checked(&mut self, payload: Payload) -> Result<Record, LedgerError> {
        if let Err(err) = self.verify() {
            warn!(%err, "refusing to mine onto an invalid chain");
            return Err(err.into());
        }
        self.mine(payload)
    }

    /// Re-derive every link and proof, reporting the first failure.
    pub fn verify(&self) -> Result<(), IntegrityError> {
        ChainVerifier::verify(&self.records, &self.pow)
    }

    /// `true` when every adjacent pair passes [`Ledger::verify`].
    pub fn validate(&self) -> bool {
        self.verify().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use meterchain_crypto::DifficultyError;
    use meterchain_types::GENESIS_LINK;

    use super::*;
    use crate::config::ConfigError;
    use crate::validation::IntegrityErrorKind;

    fn ledger(difficulty: u32) -> Ledger {
        Ledger::with_difficulty(Difficulty::new(difficulty).unwrap())
    }

    fn reading(id: &str, q: f64) -> Payload {
        Payload::reading(id, q).unwrap()
    }

    fn set_link(ledger: &mut Ledger, position: usize, link: &str) {
        let r = &ledger.records[position];
        ledger.records[position] =
            Record::with_timestamp(r.position(), r.created_at(), r.payload().clone(), r.proof(), link);
    }

    #[test]
    fn fresh_ledger_has_genesis() {
        let l = ledger(2);
        assert_eq!(l.len(), 1);
        assert_eq!(l.records()[0].position(), 0);
        assert_eq!(l.records()[0].link_hash(), GENESIS_LINK);
        assert!(l.validate());
    }

    #[test]
    fn new_rejects_zero_difficulty() {
        let err = Ledger::new(&LedgerConfig { difficulty: 0 }).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Config(ConfigError::Difficulty(DifficultyError::OutOfRange(0)))
        );
    }

    #[test]
    fn mine_reading_scenario() {
        let mut l = Ledger::new(&LedgerConfig { difficulty: 2 }).unwrap();
        let genesis_hash = ContentHasher::hash_record(&l.records()[0]).unwrap();

        let record = l.mine(reading("12345", 100.0)).unwrap();
        assert_eq!(record.position(), 1);
        assert_eq!(record.link_hash(), genesis_hash);
        assert_eq!(record.payload().source_id(), Some("12345"));
        assert_eq!(record.payload().quantity(), Some(100.0));

        let digest = ProofOfWork::digest(
            record.proof(),
            l.records()[0].proof(),
            1,
            &record.payload().digest_fragment(),
        )
        .unwrap();
        assert!(digest.starts_with("00"));
        assert_eq!(l.len(), 2);
        assert!(l.validate());
    }

    #[test]
    fn mined_record_is_stored_copy() {
        let mut l = ledger(1);
        let record = l.mine(Payload::opaque("hello")).unwrap();
        assert_eq!(l.tail(), &record);
        assert_eq!(l.get(1), Some(&record));
        assert_eq!(l.get(2), None);
    }

    #[test]
    fn positions_are_dense() {
        let mut l = ledger(1);
        for i in 0..5 {
            l.mine(reading("m", i as f64)).unwrap();
        }
        let positions: Vec<u64> = l.records().iter().map(Record::position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4, 5]);
        assert!(l.validate());
    }

    #[test]
    fn validate_is_idempotent() {
        let mut l = ledger(1);
        l.mine(reading("a", 1.0)).unwrap();
        assert_eq!(l.validate(), l.validate());
        set_link(&mut l, 1, "nope");
        assert!(!l.validate());
        assert!(!l.validate());
    }

    #[test]
    fn forced_link_change_invalidates() {
        let mut l = ledger(2);
        l.mine(reading("12345", 100.0)).unwrap();
        set_link(&mut l, 1, "invalid_hash");
        assert!(!l.validate());
        assert_eq!(
            l.verify().unwrap_err().kind,
            IntegrityErrorKind::BrokenLink
        );
    }

    #[test]
    fn forced_proof_change_invalidates() {
        let mut l = ledger(2);
        l.mine(reading("12345", 100.0)).unwrap();
        let r = l.records[1].clone();
        // The winning proof is minimal, so the proof just below it never wins.
        let forged = if r.proof() > 1 { r.proof() - 1 } else { u64::MAX };
        l.records[1] = Record::with_timestamp(
            r.position(),
            r.created_at(),
            r.payload().clone(),
            forged,
            r.link_hash(),
        );
        assert_eq!(l.verify().unwrap_err().kind, IntegrityErrorKind::ProofRejected);
    }

    #[test]
    fn mine_checked_refuses_invalid_chain() {
        let mut l = ledger(1);
        l.mine(reading("a", 1.0)).unwrap();
        set_link(&mut l, 1, "broken");
        let err = l.mine_checked(reading("b", 2.0)).unwrap_err();
        assert!(matches!(err, LedgerError::IntegrityViolation(_)));
        assert_eq!(l.len(), 2);
    }

    #[test]
    fn mine_checked_appends_on_valid_chain() {
        let mut l = ledger(1);
        let r = l.mine_checked(reading("a", 1.0)).unwrap();
        assert_eq!(r.position(), 1);
    }

    #[test]
    fn readings_for_filters_by_meter() {
        let mut l = ledger(1);
        l.mine(reading("a", 1.0)).unwrap();
        l.mine(reading("b", 2.0)).unwrap();
        l.mine(Payload::opaque("a")).unwrap();
        l.mine(reading("a", 3.0)).unwrap();
        let quantities: Vec<f64> = l
            .readings_for("a")
            .filter_map(|r| r.payload().quantity())
            .collect();
        assert_eq!(quantities, vec![1.0, 3.0]);
    }

    #[test]
    fn from_records_rejects_empty() {
        let err = Ledger::from_records(vec![], Difficulty::default()).unwrap_err();
        assert_eq!(err, LedgerError::EmptyChain);
    }

    #[test]
    fn export_import_round_trip_validates() {
        let mut l = ledger(1);
        l.mine(reading("x", 4.5)).unwrap();
        l.mine(Payload::opaque("note")).unwrap();

        let json = serde_json::to_string(l.records()).unwrap();
        let records: Vec<Record> = serde_json::from_str(&json).unwrap();
        let imported = Ledger::from_records(records, l.difficulty()).unwrap();
        assert!(imported.validate());
        assert_eq!(imported.len(), 3);
    }

    #[test]
    fn mining_continues_from_imported_tail() {
        let mut l = ledger(1);
        l.mine(reading("x", 1.0)).unwrap();
        let mut imported = Ledger::from_records(l.records().to_vec(), l.difficulty()).unwrap();
        let r = imported.mine(reading("x", 2.0)).unwrap();
        assert_eq!(r.position(), 2);
        assert!(imported.validate());
    }
}
