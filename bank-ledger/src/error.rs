//! Error types for the banking core

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Banking core errors
///
/// Every operation returns one of these instead of partially applying:
/// on any error the account balances and transaction records are exactly
/// as they were before the call.
#[derive(Error, Debug)]
pub enum Error {
    /// Acting account is frozen
    #[error("Account is frozen")]
    AccountFrozen,

    /// Acting account is inactive (closed)
    #[error("Account is inactive")]
    AccountInactive,

    /// Withdrawal blocked by a minimum-balance/overdraft rule or by
    /// insufficient funds. The reason string is user-facing.
    #[error("{0}")]
    PolicyViolation(String),

    /// Transfer where sender and receiver are the same account
    #[error("Cannot transfer to your own account")]
    SelfTransferNotAllowed,

    /// Transfer receiver does not exist, is inactive, or is frozen
    #[error("Receiver account is unavailable")]
    ReceiverUnavailable,

    /// Transaction has already been rolled back
    #[error("This transaction has already been rolled back")]
    AlreadyRolledBack,

    /// Rollback transactions cannot themselves be rolled back
    #[error("Cannot rollback a rollback transaction")]
    CannotRollbackRollback,

    /// Identifier generator could not find a unique value within its retry
    /// budget. Signals near-exhaustion of the collision space; should not
    /// happen in practice.
    #[error("Could not generate a unique identifier after {0} attempts")]
    IdentifierExhausted(u32),

    /// Per-account serialization could not be obtained within the configured
    /// wait. Caller should retry the whole operation.
    #[error("Could not serialize access to the account; retry the operation")]
    ConcurrencyConflict,

    /// Underlying persistence failed
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Amount must be strictly positive
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Account not found
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Transaction not found
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Account policy not found
    #[error("Account policy not found: {0}")]
    PolicyNotFound(Uuid),

    /// Account policy is still referenced by accounts and cannot be deleted
    #[error("Account policy {0} is referenced by existing accounts")]
    PolicyInUse(Uuid),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::StoreUnavailable(err.to_string())
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Config(format!("metrics registration failed: {err}"))
    }
}
