//! NexusTrust Bank Ledger Core
//!
//! Account store, account-type policy engine, and transaction processing
//! for the NexusTrust core banking system.
//!
//! # Architecture
//!
//! - **Atomic units**: every balance mutation commits together with its
//!   transaction record in one write batch
//! - **Per-account serialization**: a lock table orders mutations on each
//!   account; operations on different accounts run in parallel
//! - **Append-only audit trail**: transaction records are never edited or
//!   deleted, rollbacks compensate with new records
//! - **Exact money**: balances and amounts are [`rust_decimal::Decimal`]
//!
//! # Invariants
//!
//! - An account's balance always equals the signed sum of its completed
//!   transactions in creation order
//! - Each record's `balance_after` is the balance immediately after that
//!   operation
//! - A transaction is rolled back at most once; rollback records are
//!   themselves never rolled back

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod error;
pub mod idgen;
pub mod ledger;
pub mod locks;
pub mod metrics;
pub mod policy;
pub mod rollback;
pub mod store;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use store::Store;
pub use types::{
    Account, AccountNumber, AccountPolicy, Category, InterestRecord, PolicySummary, RoutingCode,
    Transaction, TransactionId, TransactionKind, TransactionStatus, TransferDirection,
};
