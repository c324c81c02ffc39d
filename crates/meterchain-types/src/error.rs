use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("quantity must be a finite number, got {0}")]
    NonFiniteQuantity(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
