//! NexusTrust Interest Accrual Engine
//!
//! Monthly batch that credits simple interest to eligible savings
//! accounts through the [`bank_ledger`] core.
//!
//! # Cycle
//!
//! 1. **Scan**: list all accounts in the ledger
//! 2. **Select**: active, unfrozen, positive-balance savings accounts
//! 3. **Compute**: one month of simple interest at the policy's annual rate
//! 4. **Credit**: apply through the ledger as an atomic interest credit
//!
//! Per-account failures are collected in the cycle report; a bad account
//! never aborts the batch.
//!
//! # Example
//!
//! ```no_run
//! use interest_engine::{Config, InterestEngine};
//! use std::sync::Arc;
//!
//! fn main() -> interest_engine::Result<()> {
//!     let config = Config::default();
//!     let ledger = Arc::new(bank_ledger::Ledger::open(config.ledger)?);
//!     let engine = InterestEngine::new(ledger);
//!
//!     let as_of = chrono::Utc::now().date_naive();
//!     let report = engine.run_interest_cycle(as_of)?;
//!     println!("Credited {} accounts, {} total", report.credited, report.total_interest);
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod engine;
pub mod error;
pub mod schedule;

// Re-exports
pub use config::Config;
pub use engine::{CycleReport, InterestEngine};
pub use error::{Error, Result};
pub use schedule::{ScheduleConfig, Scheduler};
