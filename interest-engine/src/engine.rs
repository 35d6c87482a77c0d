//! Monthly interest accrual cycle
//!
//! Scans all accounts, selects eligible savings accounts, computes one
//! month of simple interest on the current balance, and credits each
//! through the ledger. One account failing never aborts the cycle; its
//! error is collected in the report and the scan moves on.
//!
//! Eligible means: active, not frozen, positive balance, and an assigned
//! policy in the savings category. Accounts with no assigned policy do
//! not accrue.

use crate::{Error, Result};
use bank_ledger::{Category, Ledger};
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// One month of simple interest on `balance` at annual `rate` percent,
/// rounded to 2 decimal places (banker's rounding)
pub fn monthly_interest(balance: Decimal, rate: Decimal) -> Decimal {
    (balance * rate / Decimal::from(1200)).round_dp(2)
}

/// Outcome of one accrual cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Accrual period end date
    pub as_of: NaiveDate,

    /// Accounts examined
    pub scanned: usize,

    /// Accounts credited
    pub credited: usize,

    /// Sum of all interest credited this cycle
    pub total_interest: Decimal,

    /// Per-account failures, collected rather than aborting the cycle
    pub failures: Vec<(Uuid, String)>,
}

/// Interest accrual engine
pub struct InterestEngine {
    ledger: Arc<Ledger>,
}

impl InterestEngine {
    /// Create engine over an open ledger
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }

    /// Run one full accrual cycle with `as_of` as the period end
    pub fn run_interest_cycle(&self, as_of: NaiveDate) -> Result<CycleReport> {
        let period_start = as_of
            .checked_sub_months(Months::new(1))
            .ok_or_else(|| Error::Schedule(format!("No month preceding {as_of}")))?;

        let accounts = self.ledger.accounts().map_err(Error::Ledger)?;
        let mut report = CycleReport {
            as_of,
            scanned: accounts.len(),
            credited: 0,
            total_interest: Decimal::ZERO,
            failures: Vec::new(),
        };

        info!(as_of = %as_of, accounts = accounts.len(), "Starting interest accrual cycle");

        for account in &accounts {
            if !account.is_active || account.is_frozen || account.balance <= Decimal::ZERO {
                continue;
            }
            let Some(policy_id) = account.policy_id else {
                continue;
            };

            match self.accrue_account(account.id, policy_id, period_start, as_of) {
                Ok(Some(amount)) => {
                    report.credited += 1;
                    report.total_interest += amount;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(account_id = %account.id, error = %e, "Interest accrual failed");
                    report.failures.push((account.id, e.to_string()));
                }
            }
        }

        info!(
            as_of = %as_of,
            scanned = report.scanned,
            credited = report.credited,
            total_interest = %report.total_interest,
            failures = report.failures.len(),
            "Interest accrual cycle finished"
        );

        Ok(report)
    }

    /// Accrue one account; `Ok(None)` means not in scope for interest
    fn accrue_account(
        &self,
        account_id: Uuid,
        policy_id: Uuid,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<Option<Decimal>> {
        let policy = self.ledger.policy(policy_id)?;
        if !policy.is_active || !matches!(policy.category, Category::Savings { .. }) {
            return Ok(None);
        }

        // Interest is computed on the balance at scan time
        let account = self.ledger.account(account_id)?;
        let amount = monthly_interest(account.balance, policy.interest_rate);
        if amount <= Decimal::ZERO {
            return Ok(None);
        }

        let description = format!("Monthly interest credit @ {}%", policy.interest_rate);
        self.ledger.credit_interest(
            account_id,
            amount,
            policy.interest_rate,
            period_start,
            period_end,
            &description,
        )?;

        Ok(Some(amount))
    }
}
