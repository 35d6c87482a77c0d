//! Main ledger orchestration layer
//!
//! Ties together the store, policy engine, identifier generator, and the
//! per-account lock table into the high-level API for balance mutation.
//!
//! Every mutating operation is an atomic unit: it holds the owning
//! account's lock across read-validate-write, and commits the balance
//! update together with its transaction record in one write batch. On any
//! error nothing is applied.
//!
//! # Example
//!
//! ```no_run
//! use bank_ledger::{Config, Ledger};
//! use rust_decimal::Decimal;
//!
//! fn main() -> bank_ledger::Result<()> {
//!     let ledger = Ledger::open(Config::default())?;
//!
//!     let account = ledger.open_account(None)?;
//!     let txn = ledger.deposit(account.id, Decimal::new(5000, 0), "Opening deposit", None)?;
//!     assert_eq!(txn.balance_after, Decimal::new(5000, 0));
//!
//!     Ok(())
//! }
//! ```

use crate::{
    config::Config,
    error::{Error, Result},
    idgen::IdGenerator,
    locks::AccountLocks,
    metrics::Metrics,
    policy,
    store::Store,
    types::{
        Account, AccountPolicy, Category, InterestRecord, PolicySummary, Transaction,
        TransactionKind, TransactionStatus, TransferDirection,
    },
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Main ledger interface
pub struct Ledger {
    /// Durable store
    store: Arc<Store>,

    /// Per-account serialization
    locks: AccountLocks,

    /// Identifier generation
    idgen: IdGenerator,

    /// Prometheus metrics
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl Ledger {
    /// Open ledger with configuration
    pub fn open(config: Config) -> Result<Self> {
        let store = Arc::new(Store::open(&config)?);
        let locks = AccountLocks::new(Duration::from_millis(config.locking.acquire_timeout_ms));
        let idgen = IdGenerator::new(store.clone(), config.identifiers.max_attempts);
        let metrics = Metrics::new()?;

        Ok(Self {
            store,
            locks,
            idgen,
            metrics,
            config,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Metrics registry for scraping
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    // Account and policy management

    /// Open a new account with a zero balance.
    ///
    /// The account number and routing code are generated here, exactly
    /// once; they are never regenerated afterwards.
    pub fn open_account(&self, policy_id: Option<Uuid>) -> Result<Account> {
        if let Some(id) = policy_id {
            self.store.get_policy(id)?;
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::now_v7(),
            account_number: self.idgen.account_number()?,
            routing_code: self.idgen.routing_code()?,
            balance: Decimal::ZERO,
            policy_id,
            is_active: true,
            is_frozen: false,
            opened_at: now,
            updated_at: now,
        };

        self.store.create_account(&account)?;

        tracing::info!(
            account_id = %account.id,
            account_number = %account.account_number,
            "Account opened"
        );

        Ok(account)
    }

    /// Get account by internal id
    pub fn account(&self, account_id: Uuid) -> Result<Account> {
        self.store.get_account(account_id)
    }

    /// Get account by customer-facing account number
    pub fn account_by_number(&self, number: &crate::types::AccountNumber) -> Result<Option<Account>> {
        self.store.get_account_by_number(number)
    }

    /// All accounts (accrual batch scan)
    pub fn accounts(&self) -> Result<Vec<Account>> {
        self.store.list_accounts()
    }

    /// Freeze or unfreeze an account. Frozen accounts reject all balance
    /// mutations until unfrozen; no transaction record is written.
    pub fn set_frozen(&self, account_id: Uuid, frozen: bool) -> Result<Account> {
        let _guard = self.locks.acquire(account_id)?;
        let mut account = self.store.get_account(account_id)?;
        account.is_frozen = frozen;
        account.updated_at = Utc::now();
        self.store.put_account(&account)?;

        tracing::info!(account_id = %account.id, frozen, "Account freeze state changed");
        Ok(account)
    }

    /// Activate or deactivate an account. Accounts are never deleted.
    pub fn set_active(&self, account_id: Uuid, active: bool) -> Result<Account> {
        let _guard = self.locks.acquire(account_id)?;
        let mut account = self.store.get_account(account_id)?;
        account.is_active = active;
        account.updated_at = Utc::now();
        self.store.put_account(&account)?;

        tracing::info!(account_id = %account.id, active, "Account active state changed");
        Ok(account)
    }

    /// Create an account-type policy
    pub fn create_policy(
        &self,
        name: &str,
        category: Category,
        interest_rate: Decimal,
    ) -> Result<AccountPolicy> {
        let policy = AccountPolicy {
            id: Uuid::now_v7(),
            name: name.to_string(),
            category,
            interest_rate,
            is_active: true,
            created_at: Utc::now(),
        };
        self.store.put_policy(&policy)?;
        Ok(policy)
    }

    /// Get policy by id
    pub fn policy(&self, policy_id: Uuid) -> Result<AccountPolicy> {
        self.store.get_policy(policy_id)
    }

    /// All policies
    pub fn policies(&self) -> Result<Vec<AccountPolicy>> {
        self.store.list_policies()
    }

    /// Delete a policy; blocked while any account references it
    pub fn delete_policy(&self, policy_id: Uuid) -> Result<()> {
        self.store.delete_policy(policy_id)
    }

    // Primary operations

    /// Deposit `amount` into an account.
    ///
    /// Deposits are always allowed for active, unfrozen accounts; the
    /// policy engine is not consulted.
    pub fn deposit(
        &self,
        account_id: Uuid,
        amount: Decimal,
        description: &str,
        ip_address: Option<IpAddr>,
    ) -> Result<Transaction> {
        Self::ensure_positive(amount)?;
        let _timer = self.metrics.operation_duration.start_timer();
        let _guard = self.locks.acquire(account_id)?;

        let mut account = self.store.get_account(account_id)?;
        Self::ensure_operable(&account)?;

        account.balance += amount;
        account.updated_at = Utc::now();

        let transaction = self.build_transaction(
            &account,
            TransactionKind::Deposit,
            amount,
            None,
            None,
            description.to_string(),
            ip_address,
        )?;

        self.store.commit_atomic(&[&account], &[&transaction], None)?;
        self.metrics.transactions_total.inc();

        tracing::debug!(
            account_id = %account.id,
            transaction_id = %transaction.transaction_id,
            amount = %amount,
            "Deposit completed"
        );

        Ok(transaction)
    }

    /// Withdraw `amount` from an account, subject to account-type policy.
    ///
    /// On refusal returns [`Error::PolicyViolation`] (or
    /// [`Error::AccountFrozen`]) with no mutation.
    pub fn withdraw(
        &self,
        account_id: Uuid,
        amount: Decimal,
        description: &str,
        ip_address: Option<IpAddr>,
    ) -> Result<Transaction> {
        Self::ensure_positive(amount)?;
        let _timer = self.metrics.operation_duration.start_timer();
        let _guard = self.locks.acquire(account_id)?;

        let mut account = self.store.get_account(account_id)?;
        Self::ensure_operable(&account)?;

        let account_policy = self.load_policy(&account)?;
        self.check_policy(&account, account_policy.as_ref(), amount)?;

        account.balance -= amount;
        account.updated_at = Utc::now();

        let transaction = self.build_transaction(
            &account,
            TransactionKind::Withdraw,
            amount,
            None,
            None,
            description.to_string(),
            ip_address,
        )?;

        self.store.commit_atomic(&[&account], &[&transaction], None)?;
        self.metrics.transactions_total.inc();

        tracing::debug!(
            account_id = %account.id,
            transaction_id = %transaction.transaction_id,
            amount = %amount,
            "Withdrawal completed"
        );

        Ok(transaction)
    }

    /// Transfer `amount` between two accounts as one atomic unit.
    ///
    /// Produces two linked records: the sender's outgoing leg and the
    /// receiver's incoming leg, each naming the other party as
    /// counterparty and carrying its own side's `balance_after`. Both
    /// balances and both legs commit together or not at all.
    pub fn transfer(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        amount: Decimal,
        description: &str,
        ip_address: Option<IpAddr>,
    ) -> Result<(Transaction, Transaction)> {
        Self::ensure_positive(amount)?;
        if sender_id == receiver_id {
            return Err(Error::SelfTransferNotAllowed);
        }
        let _timer = self.metrics.operation_duration.start_timer();
        let _guards = self.locks.acquire_pair(sender_id, receiver_id)?;

        let mut sender = self.store.get_account(sender_id)?;
        Self::ensure_operable(&sender)?;

        let mut receiver = match self.store.get_account(receiver_id) {
            Ok(account) => account,
            Err(Error::AccountNotFound(_)) => return Err(Error::ReceiverUnavailable),
            Err(e) => return Err(e),
        };
        if !receiver.is_operable() {
            return Err(Error::ReceiverUnavailable);
        }

        let sender_policy = self.load_policy(&sender)?;
        self.check_policy(&sender, sender_policy.as_ref(), amount)?;

        let now = Utc::now();
        sender.balance -= amount;
        sender.updated_at = now;
        receiver.balance += amount;
        receiver.updated_at = now;

        let outgoing = self.build_transaction(
            &sender,
            TransactionKind::Transfer {
                direction: TransferDirection::Outgoing,
            },
            amount,
            Some(receiver.id),
            None,
            format!("Transfer to {} - {}", receiver.account_number, description),
            ip_address,
        )?;
        let incoming = self.build_transaction(
            &receiver,
            TransactionKind::Transfer {
                direction: TransferDirection::Incoming,
            },
            amount,
            Some(sender.id),
            None,
            format!("Transfer from {} - {}", sender.account_number, description),
            ip_address,
        )?;

        self.store
            .commit_atomic(&[&sender, &receiver], &[&outgoing, &incoming], None)?;
        self.metrics.transactions_total.inc_by(2);

        tracing::debug!(
            sender_id = %sender.id,
            receiver_id = %receiver.id,
            transaction_id = %outgoing.transaction_id,
            amount = %amount,
            "Transfer completed"
        );

        Ok((outgoing, incoming))
    }

    /// Credit interest computed by the accrual batch.
    ///
    /// Applies the balance credit, the interest-kind transaction record,
    /// and the accrual history record in one atomic unit.
    pub fn credit_interest(
        &self,
        account_id: Uuid,
        amount: Decimal,
        rate: Decimal,
        period_start: NaiveDate,
        period_end: NaiveDate,
        description: &str,
    ) -> Result<(Transaction, InterestRecord)> {
        Self::ensure_positive(amount)?;
        let _timer = self.metrics.operation_duration.start_timer();
        let _guard = self.locks.acquire(account_id)?;

        let mut account = self.store.get_account(account_id)?;
        Self::ensure_operable(&account)?;

        let policy_snapshot = self
            .load_policy(&account)?
            .unwrap_or_else(AccountPolicy::default_policy);

        account.balance += amount;
        account.updated_at = Utc::now();

        let transaction = self.build_transaction(
            &account,
            TransactionKind::Interest,
            amount,
            None,
            None,
            description.to_string(),
            None,
        )?;
        let record = InterestRecord {
            id: Uuid::now_v7(),
            account_id: account.id,
            policy: policy_snapshot,
            amount,
            rate,
            period_start,
            period_end,
            credited_at: transaction.created_at,
        };

        self.store
            .commit_atomic(&[&account], &[&transaction], Some(&record))?;
        self.metrics.transactions_total.inc();
        self.metrics.interest_credits_total.inc();

        tracing::debug!(
            account_id = %account.id,
            transaction_id = %transaction.transaction_id,
            amount = %amount,
            "Interest credited"
        );

        Ok((transaction, record))
    }

    // Read accessors

    /// Balance usable as the withdrawal ceiling (includes overdraft for
    /// current accounts)
    pub fn available_balance(&self, account_id: Uuid) -> Result<Decimal> {
        let account = self.store.get_account(account_id)?;
        let account_policy = self.load_policy(&account)?;
        Ok(policy::available_balance(&account, account_policy.as_ref()))
    }

    /// Summary of the policy governing an account, with the system default
    /// substituted when none is assigned
    pub fn get_policy_summary(&self, account_id: Uuid) -> Result<PolicySummary> {
        let account = self.store.get_account(account_id)?;
        let account_policy = self.load_policy(&account)?;
        Ok(policy::policy_summary(account_policy.as_ref()))
    }

    /// Transaction history for an account, ordered by creation time.
    /// Read-only; callers iterate for display and export.
    pub fn transaction_history(&self, account_id: Uuid) -> Result<Vec<Transaction>> {
        self.store.account_transactions(account_id)
    }

    /// Interest accrual history for an account
    pub fn interest_history(&self, account_id: Uuid) -> Result<Vec<InterestRecord>> {
        self.store.account_interest_records(account_id)
    }

    /// Get a transaction by internal id
    pub fn transaction(&self, transaction_pk: Uuid) -> Result<Transaction> {
        self.store.get_transaction(transaction_pk)
    }

    /// Get a transaction by customer-facing reference
    pub fn transaction_by_ref(
        &self,
        reference: &crate::types::TransactionId,
    ) -> Result<Transaction> {
        self.store.get_transaction_by_ref(reference)
    }

    /// Verify the audit-trail invariant for one account: the balance
    /// equals the signed sum of completed transactions in creation order,
    /// and every record's `balance_after` equals the running sum at that
    /// point. Rollback records contribute the negation of the record they
    /// reverse.
    pub fn check_balance_consistency(&self, account_id: Uuid) -> Result<bool> {
        let account = self.store.get_account(account_id)?;
        let history = self.store.account_transactions(account_id)?;

        let mut running = Decimal::ZERO;
        let mut effects: HashMap<Uuid, Decimal> = HashMap::new();

        for transaction in &history {
            if !matches!(
                transaction.status,
                TransactionStatus::Completed | TransactionStatus::RolledBack
            ) {
                continue;
            }

            let effect = match transaction.kind.signed_amount(transaction.amount) {
                Some(effect) => effect,
                None => {
                    // Rollback: negate the effect of the record it reverses
                    let Some(target) = transaction.reverses else {
                        return Ok(false);
                    };
                    match effects.get(&target) {
                        Some(effect) => -effect,
                        None => return Ok(false),
                    }
                }
            };

            effects.insert(transaction.id, effect);
            running += effect;

            if transaction.balance_after != running {
                return Ok(false);
            }
        }

        Ok(running == account.balance)
    }

    // Internal helpers

    pub(crate) fn ensure_positive(amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(amount));
        }
        Ok(())
    }

    pub(crate) fn ensure_operable(account: &Account) -> Result<()> {
        if !account.is_active {
            return Err(Error::AccountInactive);
        }
        if account.is_frozen {
            return Err(Error::AccountFrozen);
        }
        Ok(())
    }

    pub(crate) fn load_policy(&self, account: &Account) -> Result<Option<AccountPolicy>> {
        account
            .policy_id
            .map(|id| self.store.get_policy(id))
            .transpose()
    }

    fn check_policy(
        &self,
        account: &Account,
        account_policy: Option<&AccountPolicy>,
        amount: Decimal,
    ) -> Result<()> {
        policy::evaluate_withdrawal(account, account_policy, amount).map_err(|e| {
            if matches!(e, Error::PolicyViolation(_)) {
                self.metrics.policy_rejections_total.inc();
            }
            e
        })
    }

    pub(crate) fn build_transaction(
        &self,
        account: &Account,
        kind: TransactionKind,
        amount: Decimal,
        counterparty: Option<Uuid>,
        reverses: Option<Uuid>,
        description: String,
        ip_address: Option<IpAddr>,
    ) -> Result<Transaction> {
        Ok(Transaction {
            id: Uuid::now_v7(),
            transaction_id: self.idgen.transaction_id()?,
            account_id: account.id,
            kind,
            amount,
            balance_after: account.balance,
            status: TransactionStatus::Completed,
            is_rolled_back: false,
            counterparty,
            reverses,
            description,
            ip_address,
            created_at: Utc::now(),
        })
    }

    pub(crate) fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub(crate) fn locks(&self) -> &AccountLocks {
        &self.locks
    }
}
