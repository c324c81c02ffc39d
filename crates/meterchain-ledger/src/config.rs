use meterchain_crypto::{Difficulty, DifficultyError};
use serde::{Deserialize, Serialize};

/// Environment variable consulted by [`LedgerConfig::from_env`].
pub const DIFFICULTY_ENV: &str = "METERCHAIN_DIFFICULTY";

/// Ledger configuration, read once when a ledger is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Leading zero hex characters required of every proof-of-work digest.
    pub difficulty: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::DEFAULT.get(),
        }
    }
}

impl LedgerConfig {
    /// Load from the process environment. A missing variable keeps the default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(DIFFICULTY_ENV) {
            config.difficulty = raw.trim().parse().map_err(|_| ConfigError::Unparsable {
                key: DIFFICULTY_ENV,
                value: raw.clone(),
            })?;
        }
        config.difficulty()?;
        Ok(config)
    }

    /// The validated difficulty.
    pub fn difficulty(&self) -> Result<Difficulty, ConfigError> {
        Ok(Difficulty::new(self.difficulty)?)
    }
}

/// Invalid or unreadable configuration. Fatal at ledger construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Difficulty(#[from] DifficultyError),

    #[error("{key} must be a positive integer, got {value:?}")]
    Unparsable { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_difficulty_is_two() {
        let c = LedgerConfig::default();
        assert_eq!(c.difficulty, 2);
        assert_eq!(c.difficulty().unwrap().get(), 2);
    }

    #[test]
    fn missing_variable_keeps_default() {
        let c = LedgerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(c, LedgerConfig::default());
    }

    #[test]
    fn reads_difficulty() {
        let c = LedgerConfig::from_lookup(lookup(&[(DIFFICULTY_ENV, " 4 ")])).unwrap();
        assert_eq!(c.difficulty, 4);
    }

    #[test]
    fn rejects_zero() {
        let err = LedgerConfig::from_lookup(lookup(&[(DIFFICULTY_ENV, "0")])).unwrap_err();
        assert_eq!(err, ConfigError::Difficulty(DifficultyError::OutOfRange(0)));
    }

    #[test]
    fn rejects_garbage() {
        let err = LedgerConfig::from_lookup(lookup(&[(DIFFICULTY_ENV, "-3")])).unwrap_err();
        assert!(matches!(err, ConfigError::Unparsable { .. }));
    }

    #[test]
    fn deserializes_with_defaults() {
        let c: LedgerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(c.difficulty, 2);
        let c: LedgerConfig = serde_json::from_str(r#"{"difficulty": 3}"#).unwrap();
        assert_eq!(c.difficulty, 3);
    }
}
