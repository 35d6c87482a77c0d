//! Core types for the banking ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (Decimal for money)
//! - Soft lifecycle states (accounts are never deleted)

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use uuid::Uuid;

/// Customer-facing account number (e.g. `NTB2508301230454821`, 16 chars)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Create new account number
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Branch routing code (e.g. `NTB4XQZ7`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutingCode(String);

impl RoutingCode {
    /// Create new routing code
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoutingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Customer-facing transaction reference (e.g. `TXN250830123045A1B2C3`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(String);

impl TransactionId {
    /// Create new transaction reference
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account-type category with its category-specific parameters.
///
/// The withdrawal rules live with the variant that needs them, so the
/// policy engine matches once instead of comparing category strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Category {
    /// Savings account: balance may never dip below the floor
    Savings {
        /// Minimum balance the account must retain after any withdrawal
        minimum_balance: Decimal,
    },
    /// Current account: balance may go negative up to the overdraft limit
    Current {
        /// Maximum negative balance allowed
        overdraft_limit: Decimal,
    },
    /// Fixed deposit
    Fixed,
    /// Recurring deposit
    Recurring,
}

impl Category {
    /// Minimum balance floor (zero for non-savings categories)
    pub fn minimum_balance(&self) -> Decimal {
        match self {
            Category::Savings { minimum_balance } => *minimum_balance,
            _ => Decimal::ZERO,
        }
    }

    /// Overdraft allowance (zero for non-current categories)
    pub fn overdraft_limit(&self) -> Decimal {
        match self {
            Category::Current { overdraft_limit } => *overdraft_limit,
            _ => Decimal::ZERO,
        }
    }

    /// Lowercase label used in descriptions and exports
    pub fn label(&self) -> &'static str {
        match self {
            Category::Savings { .. } => "savings",
            Category::Current { .. } => "current",
            Category::Fixed => "fixed",
            Category::Recurring => "recurring",
        }
    }
}

/// Named account-type configuration governing withdrawal rules and interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountPolicy {
    /// Stable internal identity
    pub id: Uuid,

    /// Display name, e.g. "Premium Savings"
    pub name: String,

    /// Category and its parameters
    pub category: Category,

    /// Annual simple interest rate in percent
    pub interest_rate: Decimal,

    /// Inactive policies cannot be assigned to new accounts
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl AccountPolicy {
    /// The implicit system default substituted at read time for accounts
    /// with no assigned policy: savings, 1000 minimum balance, 3.5% annual
    /// interest, no overdraft. Never persisted.
    pub fn default_policy() -> Self {
        Self {
            id: Uuid::nil(),
            name: "Savings Account".to_string(),
            category: Category::Savings {
                minimum_balance: Decimal::new(1000, 0),
            },
            interest_rate: Decimal::new(35, 1),
            is_active: true,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// A customer account holding a balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable internal identity
    pub id: Uuid,

    /// Unique generated account number, immutable after opening
    pub account_number: AccountNumber,

    /// Unique generated routing code, immutable after opening
    pub routing_code: RoutingCode,

    /// Current balance. Always consistent with the signed sum of completed
    /// transactions for this account since opening.
    pub balance: Decimal,

    /// Weak reference to the governing policy. `None` falls back to
    /// [`AccountPolicy::default_policy`] for summaries.
    pub policy_id: Option<Uuid>,

    /// Inactive accounts accept no operations
    pub is_active: bool,

    /// Frozen accounts accept no balance mutations
    pub is_frozen: bool,

    /// Opening timestamp
    pub opened_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// True when the account can take part in balance mutations
    pub fn is_operable(&self) -> bool {
        self.is_active && !self.is_frozen
    }
}

/// Which side of a transfer a record represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferDirection {
    /// Sender leg: amount was debited from this account
    Outgoing,
    /// Receiver leg: amount was credited to this account
    Incoming,
}

/// Kind of balance-affecting transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Cash deposit
    Deposit,
    /// Cash withdrawal
    Withdraw,
    /// One leg of a two-leg transfer
    Transfer {
        /// Debit or credit side
        direction: TransferDirection,
    },
    /// Compensating transaction reversing an earlier one
    Rollback,
    /// Interest credit from the accrual batch
    Interest,
}

impl TransactionKind {
    /// Lowercase label used in descriptions and exports
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
            TransactionKind::Transfer { .. } => "transfer",
            TransactionKind::Rollback => "rollback",
            TransactionKind::Interest => "interest",
        }
    }

    /// Signed balance effect of this kind applied to `amount`, if the kind
    /// has an intrinsic direction. Rollback records have none; their effect
    /// is the negation of the record they reverse.
    pub fn signed_amount(&self, amount: Decimal) -> Option<Decimal> {
        match self {
            TransactionKind::Deposit
            | TransactionKind::Interest
            | TransactionKind::Transfer {
                direction: TransferDirection::Incoming,
            } => Some(amount),
            TransactionKind::Withdraw
            | TransactionKind::Transfer {
                direction: TransferDirection::Outgoing,
            } => Some(-amount),
            TransactionKind::Rollback => None,
        }
    }
}

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Created but not yet applied
    Pending,
    /// Applied; the record is immutable apart from the rollback flip
    Completed,
    /// Rejected before any balance effect
    Failed,
    /// A completed transaction later reversed by a rollback record
    RolledBack,
}

/// An immutable record of one balance mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Stable internal identity (UUIDv7 for time-ordering)
    pub id: Uuid,

    /// Unique generated reference, immutable
    pub transaction_id: TransactionId,

    /// Owning account
    pub account_id: Uuid,

    /// Kind of mutation
    pub kind: TransactionKind,

    /// Amount moved; always strictly positive
    pub amount: Decimal,

    /// Snapshot of the owner's balance immediately after this transaction
    /// applied. Never regenerated.
    pub balance_after: Decimal,

    /// Lifecycle status
    pub status: TransactionStatus,

    /// Set once when a rollback reverses this record
    pub is_rolled_back: bool,

    /// The other party on a transfer leg
    pub counterparty: Option<Uuid>,

    /// For rollback records: the transaction being compensated
    pub reverses: Option<Uuid>,

    /// Free-form description shown to the customer
    pub description: String,

    /// Caller-supplied request address, stored unvalidated
    pub ip_address: Option<IpAddr>,

    /// Creation timestamp; per-account total order
    pub created_at: DateTime<Utc>,
}

/// Record of one interest credit produced by the accrual batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestRecord {
    /// Stable internal identity
    pub id: Uuid,

    /// Account credited
    pub account_id: Uuid,

    /// Snapshot of the policy in force when interest was computed
    pub policy: AccountPolicy,

    /// Interest amount credited
    pub amount: Decimal,

    /// Annual rate in percent used for the computation
    pub rate: Decimal,

    /// Start of the accrual period
    pub period_start: NaiveDate,

    /// End of the accrual period
    pub period_end: NaiveDate,

    /// When the credit was applied
    pub credited_at: DateTime<Utc>,
}

/// Read-model of the policy governing an account, with defaults substituted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySummary {
    /// Policy display name
    pub name: String,
    /// Category label
    pub category: String,
    /// Minimum balance floor
    pub minimum_balance: Decimal,
    /// Annual interest rate in percent
    pub interest_rate: Decimal,
    /// Overdraft allowance
    pub overdraft_limit: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_accessors() {
        let savings = Category::Savings {
            minimum_balance: Decimal::new(1000, 0),
        };
        assert_eq!(savings.minimum_balance(), Decimal::new(1000, 0));
        assert_eq!(savings.overdraft_limit(), Decimal::ZERO);
        assert_eq!(savings.label(), "savings");

        let current = Category::Current {
            overdraft_limit: Decimal::new(25000, 0),
        };
        assert_eq!(current.minimum_balance(), Decimal::ZERO);
        assert_eq!(current.overdraft_limit(), Decimal::new(25000, 0));
        assert_eq!(current.label(), "current");
    }

    #[test]
    fn test_default_policy() {
        let policy = AccountPolicy::default_policy();
        assert_eq!(policy.category.minimum_balance(), Decimal::new(1000, 0));
        assert_eq!(policy.interest_rate, Decimal::new(35, 1));
        assert_eq!(policy.category.overdraft_limit(), Decimal::ZERO);
    }

    #[test]
    fn test_signed_amounts() {
        let amount = Decimal::new(500, 0);
        assert_eq!(
            TransactionKind::Deposit.signed_amount(amount),
            Some(amount)
        );
        assert_eq!(
            TransactionKind::Withdraw.signed_amount(amount),
            Some(-amount)
        );
        assert_eq!(
            TransactionKind::Transfer {
                direction: TransferDirection::Outgoing
            }
            .signed_amount(amount),
            Some(-amount)
        );
        assert_eq!(
            TransactionKind::Transfer {
                direction: TransferDirection::Incoming
            }
            .signed_amount(amount),
            Some(amount)
        );
        assert_eq!(TransactionKind::Interest.signed_amount(amount), Some(amount));
        assert_eq!(TransactionKind::Rollback.signed_amount(amount), None);
    }
}
