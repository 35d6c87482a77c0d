//! Error types for the interest accrual engine

use thiserror::Error;

/// Result type for accrual operations
pub type Result<T> = std::result::Result<T, Error>;

/// Accrual engine errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[from] bank_ledger::Error),

    /// Schedule computation error
    #[error("Schedule error: {0}")]
    Schedule(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
