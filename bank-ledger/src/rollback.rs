//! Transaction rollback (compensation)
//!
//! A rollback never edits or deletes the original record. It applies the
//! opposite balance movement, flips the original to `RolledBack`, and
//! appends a new rollback-kind record pointing back at the original. Both
//! records and the balance update commit in one atomic unit.
//!
//! Two guards hold forever: a record can be rolled back at most once, and
//! rollback records themselves can never be rolled back.

use crate::{
    error::{Error, Result},
    ledger::Ledger,
    types::{Transaction, TransactionKind, TransactionStatus, TransferDirection},
};
use chrono::Utc;
use uuid::Uuid;

impl Ledger {
    /// Roll back a completed transaction by internal id.
    ///
    /// For a transfer this compensates one leg only; the counterparty leg
    /// is untouched and must be rolled back by its own explicit call.
    pub fn rollback(&self, transaction_pk: Uuid) -> Result<Transaction> {
        // Cheap pre-checks before taking the account lock
        let peek = self.store().get_transaction(transaction_pk)?;
        Self::check_rollbackable(&peek)?;

        let _guard = self.locks().acquire(peek.account_id)?;

        // Re-read under the lock; a concurrent rollback may have won
        let mut original = self.store().get_transaction(transaction_pk)?;
        Self::check_rollbackable(&original)?;

        let mut account = self.store().get_account(original.account_id)?;
        Self::ensure_operable(&account)?;

        match original.kind {
            TransactionKind::Deposit
            | TransactionKind::Interest
            | TransactionKind::Transfer {
                direction: TransferDirection::Incoming,
            } => {
                account.balance -= original.amount;
            }
            TransactionKind::Withdraw
            | TransactionKind::Transfer {
                direction: TransferDirection::Outgoing,
            } => {
                account.balance += original.amount;
            }
            TransactionKind::Rollback => return Err(Error::CannotRollbackRollback),
        }
        account.updated_at = Utc::now();

        original.status = TransactionStatus::RolledBack;
        original.is_rolled_back = true;

        let description = match original.kind {
            TransactionKind::Transfer {
                direction: TransferDirection::Incoming,
            } => format!("Rollback of received transfer: {}", original.transaction_id),
            ref kind => format!("Rollback of {}: {}", kind.label(), original.transaction_id),
        };

        // Counterparty is a transfer-leg field; the rollback record links
        // to the original through `reverses` instead
        let compensation = self.build_transaction(
            &account,
            TransactionKind::Rollback,
            original.amount,
            None,
            Some(original.id),
            description,
            None,
        )?;

        self.store()
            .commit_atomic(&[&account], &[&original, &compensation], None)?;
        self.metrics().transactions_total.inc();
        self.metrics().rollbacks_total.inc();

        tracing::info!(
            account_id = %account.id,
            original = %original.transaction_id,
            compensation = %compensation.transaction_id,
            amount = %original.amount,
            "Transaction rolled back"
        );

        Ok(compensation)
    }

    fn check_rollbackable(transaction: &Transaction) -> Result<()> {
        if transaction.kind == TransactionKind::Rollback {
            return Err(Error::CannotRollbackRollback);
        }
        if transaction.is_rolled_back || transaction.status == TransactionStatus::RolledBack {
            return Err(Error::AlreadyRolledBack);
        }
        Ok(())
    }
}
