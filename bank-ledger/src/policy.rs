//! Withdrawal eligibility rules per account-type category
//!
//! The rules mirror the account-type contract:
//!
//! - savings accounts may never dip below their minimum balance
//! - current accounts may go negative up to their overdraft limit
//! - every withdrawal additionally passes a plain sufficient-funds check,
//!   relaxed only where a current account's overdraft covers the amount
//!
//! Accounts with no assigned policy get the plain sufficient-funds check
//! and nothing else; the richer default policy is substituted only for
//! summary reads, never for withdrawal evaluation.

use crate::{
    error::{Error, Result},
    types::{Account, AccountPolicy, Category, PolicySummary},
};
use rust_decimal::Decimal;

/// Check whether `amount` may be withdrawn from `account` under `policy`.
///
/// Returns `Ok(())` when allowed; otherwise [`Error::AccountFrozen`] or a
/// [`Error::PolicyViolation`] carrying the user-facing reason. Pure check,
/// no mutation.
pub fn evaluate_withdrawal(
    account: &Account,
    policy: Option<&AccountPolicy>,
    amount: Decimal,
) -> Result<()> {
    if account.is_frozen {
        return Err(Error::AccountFrozen);
    }

    let balance = account.balance;

    let policy = match policy {
        Some(policy) => policy,
        None => {
            if balance >= amount {
                return Ok(());
            }
            return Err(Error::PolicyViolation("Insufficient balance".to_string()));
        }
    };

    match policy.category {
        Category::Savings { minimum_balance } => {
            if balance - amount < minimum_balance {
                return Err(Error::PolicyViolation(format!(
                    "Cannot withdraw below minimum balance of {minimum_balance}"
                )));
            }
        }
        Category::Current { overdraft_limit } => {
            if balance - amount < -overdraft_limit {
                return Err(Error::PolicyViolation(format!(
                    "Overdraft limit of {overdraft_limit} exceeded"
                )));
            }
        }
        Category::Fixed | Category::Recurring => {}
    }

    // Secondary sufficient-funds check. For current accounts this overlaps
    // the overdraft rule above; both must hold.
    let overdraft_covers = matches!(policy.category, Category::Current { .. })
        && balance + policy.category.overdraft_limit() >= amount;
    if amount > balance && !overdraft_covers {
        return Err(Error::PolicyViolation("Insufficient balance".to_string()));
    }

    Ok(())
}

/// Balance usable as the withdrawal ceiling: the plain balance, plus the
/// overdraft allowance for current accounts.
pub fn available_balance(account: &Account, policy: Option<&AccountPolicy>) -> Decimal {
    match policy.map(|p| &p.category) {
        Some(Category::Current { overdraft_limit }) => account.balance + overdraft_limit,
        _ => account.balance,
    }
}

/// Summarize the policy governing an account, substituting the system
/// default when none is assigned.
pub fn policy_summary(policy: Option<&AccountPolicy>) -> PolicySummary {
    let default;
    let policy = match policy {
        Some(policy) => policy,
        None => {
            default = AccountPolicy::default_policy();
            &default
        }
    };

    PolicySummary {
        name: policy.name.clone(),
        category: policy.category.label().to_string(),
        minimum_balance: policy.category.minimum_balance(),
        interest_rate: policy.interest_rate,
        overdraft_limit: policy.category.overdraft_limit(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn test_account(balance: Decimal, policy_id: Option<Uuid>) -> Account {
        Account {
            id: Uuid::new_v4(),
            account_number: crate::types::AccountNumber::new("NTB2508301230454821"),
            routing_code: crate::types::RoutingCode::new("NTB4XQZ7"),
            balance,
            policy_id,
            is_active: true,
            is_frozen: false,
            opened_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn savings_policy(minimum_balance: Decimal) -> AccountPolicy {
        AccountPolicy {
            id: Uuid::new_v4(),
            name: "Standard Savings".to_string(),
            category: Category::Savings { minimum_balance },
            interest_rate: Decimal::new(35, 1),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn current_policy(overdraft_limit: Decimal) -> AccountPolicy {
        AccountPolicy {
            id: Uuid::new_v4(),
            name: "Business Current".to_string(),
            category: Category::Current { overdraft_limit },
            interest_rate: Decimal::ZERO,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_frozen_account_rejected() {
        let mut account = test_account(Decimal::new(5000, 0), None);
        account.is_frozen = true;

        let result = evaluate_withdrawal(&account, None, Decimal::new(100, 0));
        assert!(matches!(result, Err(Error::AccountFrozen)));
    }

    #[test]
    fn test_no_policy_sufficient_funds_only() {
        let account = test_account(Decimal::new(500, 0), None);

        assert!(evaluate_withdrawal(&account, None, Decimal::new(500, 0)).is_ok());
        assert!(matches!(
            evaluate_withdrawal(&account, None, Decimal::new(501, 0)),
            Err(Error::PolicyViolation(_))
        ));
    }

    #[test]
    fn test_savings_minimum_balance_floor() {
        let policy = savings_policy(Decimal::new(1000, 0));
        let account = test_account(Decimal::new(1500, 0), Some(policy.id));

        // 1500 - 600 = 900 < 1000: refused with the floor in the reason
        let err = evaluate_withdrawal(&account, Some(&policy), Decimal::new(600, 0)).unwrap_err();
        match err {
            Error::PolicyViolation(reason) => assert!(reason.contains("1000")),
            other => panic!("unexpected error: {other}"),
        }

        // 1500 - 500 = 1000: exactly at the floor, allowed
        assert!(evaluate_withdrawal(&account, Some(&policy), Decimal::new(500, 0)).is_ok());
    }

    #[test]
    fn test_current_overdraft_boundary() {
        let policy = current_policy(Decimal::new(25000, 0));
        let account = test_account(Decimal::ZERO, Some(policy.id));

        // Exactly at the limit: allowed
        assert!(evaluate_withdrawal(&account, Some(&policy), Decimal::new(25000, 0)).is_ok());

        // One paisa over: refused with the limit in the reason
        let err =
            evaluate_withdrawal(&account, Some(&policy), Decimal::new(2500001, 2)).unwrap_err();
        match err {
            Error::PolicyViolation(reason) => assert!(reason.contains("25000")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fixed_category_sufficient_funds() {
        let policy = AccountPolicy {
            category: Category::Fixed,
            ..savings_policy(Decimal::ZERO)
        };
        let account = test_account(Decimal::new(2000, 0), Some(policy.id));

        assert!(evaluate_withdrawal(&account, Some(&policy), Decimal::new(2000, 0)).is_ok());
        assert!(matches!(
            evaluate_withdrawal(&account, Some(&policy), Decimal::new(2001, 0)),
            Err(Error::PolicyViolation(_))
        ));
    }

    #[test]
    fn test_available_balance() {
        let policy = current_policy(Decimal::new(25000, 0));
        let account = test_account(Decimal::new(100, 0), Some(policy.id));
        assert_eq!(
            available_balance(&account, Some(&policy)),
            Decimal::new(25100, 0)
        );

        let savings = savings_policy(Decimal::new(1000, 0));
        assert_eq!(
            available_balance(&account, Some(&savings)),
            Decimal::new(100, 0)
        );
        assert_eq!(available_balance(&account, None), Decimal::new(100, 0));
    }

    #[test]
    fn test_summary_falls_back_to_default() {
        let summary = policy_summary(None);
        assert_eq!(summary.category, "savings");
        assert_eq!(summary.minimum_balance, Decimal::new(1000, 0));
        assert_eq!(summary.interest_rate, Decimal::new(35, 1));
        assert_eq!(summary.overdraft_limit, Decimal::ZERO);

        let policy = current_policy(Decimal::new(5000, 0));
        let summary = policy_summary(Some(&policy));
        assert_eq!(summary.name, "Business Current");
        assert_eq!(summary.overdraft_limit, Decimal::new(5000, 0));
    }
}
