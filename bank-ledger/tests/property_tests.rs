//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Audit trail: balance == signed sum of completed transactions
//! - Snapshot chain: every record's balance_after matches the running sum
//! - Refusals leave no trace: failed operations mutate nothing
//! - Rollbacks compensate exactly once

use bank_ledger::{Category, Config, Error, Ledger, TransactionStatus};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use rust_decimal::Decimal;
use std::sync::Arc;

/// One step of a randomly generated account workload
#[derive(Debug, Clone)]
enum Op {
    Deposit(Decimal),
    Withdraw(Decimal),
    /// Roll back the n-th transaction recorded so far (modulo count)
    Rollback(usize),
}

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1u64..50_000_00u64).prop_map(|paise| Decimal::new(paise as i64, 2))
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => amount_strategy().prop_map(Op::Deposit),
        3 => amount_strategy().prop_map(Op::Withdraw),
        1 => (0usize..16).prop_map(Op::Rollback),
    ]
}

/// Create test ledger with temp directory
fn create_test_ledger() -> (Ledger, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.data_dir = temp_dir.path().to_path_buf();
    (Ledger::open(config).unwrap(), temp_dir)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: after any workload of deposits, withdrawals, and
    /// rollbacks, the balance equals the signed transaction sum and every
    /// snapshot in the history matches its running sum.
    #[test]
    fn prop_audit_trail_holds(ops in prop::collection::vec(op_strategy(), 1..25)) {
        let (ledger, _temp) = create_test_ledger();
        let account = ledger.open_account(None).unwrap();

        let mut expected = Decimal::ZERO;
        let mut recorded: Vec<uuid::Uuid> = Vec::new();

        for op in ops {
            match op {
                Op::Deposit(amount) => {
                    let txn = ledger.deposit(account.id, amount, "load", None).unwrap();
                    expected += amount;
                    prop_assert_eq!(txn.balance_after, expected);
                    recorded.push(txn.id);
                }
                Op::Withdraw(amount) => {
                    match ledger.withdraw(account.id, amount, "load", None) {
                        Ok(txn) => {
                            expected -= amount;
                            prop_assert_eq!(txn.balance_after, expected);
                            recorded.push(txn.id);
                        }
                        Err(Error::PolicyViolation(_)) => {
                            // Refusal must leave the balance untouched
                            prop_assert!(amount > expected);
                        }
                        Err(e) => return Err(TestCaseError::fail(e.to_string())),
                    }
                }
                Op::Rollback(n) => {
                    if recorded.is_empty() {
                        continue;
                    }
                    let target = recorded[n % recorded.len()];
                    match ledger.rollback(target) {
                        Ok(compensation) => {
                            let original = ledger.transaction(target).unwrap();
                            let effect = original
                                .kind
                                .signed_amount(original.amount)
                                .unwrap();
                            expected -= effect;
                            prop_assert_eq!(compensation.balance_after, expected);
                            prop_assert_eq!(original.status, TransactionStatus::RolledBack);
                        }
                        Err(Error::AlreadyRolledBack) => {}
                        Err(e) => return Err(TestCaseError::fail(e.to_string())),
                    }
                }
            }
        }

        prop_assert_eq!(ledger.account(account.id).unwrap().balance, expected);
        prop_assert!(ledger.check_balance_consistency(account.id).unwrap());
    }

    /// Property: a savings account never drops below its minimum balance
    /// through any sequence of withdrawals.
    #[test]
    fn prop_savings_floor_never_breached(
        opening in 1_000u64..100_000u64,
        withdrawals in prop::collection::vec(amount_strategy(), 1..15),
    ) {
        let (ledger, _temp) = create_test_ledger();
        let floor = Decimal::new(1000, 0);
        let policy = ledger
            .create_policy("Standard Savings", Category::Savings { minimum_balance: floor }, Decimal::new(35, 1))
            .unwrap();
        let account = ledger.open_account(Some(policy.id)).unwrap();
        ledger
            .deposit(account.id, Decimal::new(opening as i64, 0), "opening", None)
            .unwrap();

        for amount in withdrawals {
            let _ = ledger.withdraw(account.id, amount, "load", None);
            prop_assert!(ledger.account(account.id).unwrap().balance >= floor);
        }

        prop_assert!(ledger.check_balance_consistency(account.id).unwrap());
    }

    /// Property: transfers conserve money across the pair of accounts.
    #[test]
    fn prop_transfer_conservation(amounts in prop::collection::vec(amount_strategy(), 1..10)) {
        let (ledger, _temp) = create_test_ledger();
        let a = ledger.open_account(None).unwrap();
        let b = ledger.open_account(None).unwrap();
        let opening = Decimal::new(100_000, 0);
        ledger.deposit(a.id, opening, "opening", None).unwrap();
        ledger.deposit(b.id, opening, "opening", None).unwrap();

        for (i, amount) in amounts.iter().enumerate() {
            let (sender, receiver) = if i % 2 == 0 { (a.id, b.id) } else { (b.id, a.id) };
            let _ = ledger.transfer(sender, receiver, *amount, "shuffle", None);

            let total = ledger.account(a.id).unwrap().balance
                + ledger.account(b.id).unwrap().balance;
            prop_assert_eq!(total, opening + opening);
        }

        prop_assert!(ledger.check_balance_consistency(a.id).unwrap());
        prop_assert!(ledger.check_balance_consistency(b.id).unwrap());
    }
}

/// Two racing withdrawals that each pass the policy check in isolation but
/// not together: exactly one must win.
#[test]
fn test_concurrent_withdrawals_single_winner() {
    let (ledger, _temp) = create_test_ledger();
    let ledger = Arc::new(ledger);
    let account = ledger.open_account(None).unwrap();
    ledger
        .deposit(account.id, Decimal::new(1000, 0), "opening", None)
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..2 {
        let ledger = Arc::clone(&ledger);
        let account_id = account.id;
        handles.push(std::thread::spawn(move || {
            ledger.withdraw(account_id, Decimal::new(600, 0), "race", None)
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let account = ledger.account(account.id).unwrap();
    assert_eq!(account.balance, Decimal::new(400, 0));
    assert!(ledger.check_balance_consistency(account.id).unwrap());
}

/// Transfers touching disjoint account pairs proceed in parallel without
/// conflicting; the books still balance afterwards.
#[test]
fn test_parallel_transfers_disjoint_pairs() {
    let (ledger, _temp) = create_test_ledger();
    let ledger = Arc::new(ledger);

    let accounts: Vec<_> = (0..4).map(|_| ledger.open_account(None).unwrap()).collect();
    for account in &accounts {
        ledger
            .deposit(account.id, Decimal::new(10_000, 0), "opening", None)
            .unwrap();
    }

    let pairs = [(accounts[0].id, accounts[1].id), (accounts[2].id, accounts[3].id)];
    let mut handles = Vec::new();
    for (sender, receiver) in pairs {
        let ledger = Arc::clone(&ledger);
        handles.push(std::thread::spawn(move || {
            for _ in 0..20 {
                ledger
                    .transfer(sender, receiver, Decimal::new(100, 0), "burst", None)
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let total: Decimal = accounts
        .iter()
        .map(|a| ledger.account(a.id).unwrap().balance)
        .sum();
    assert_eq!(total, Decimal::new(40_000, 0));

    assert_eq!(
        ledger.account(accounts[0].id).unwrap().balance,
        Decimal::new(8_000, 0)
    );
    assert_eq!(
        ledger.account(accounts[1].id).unwrap().balance,
        Decimal::new(12_000, 0)
    );

    for account in &accounts {
        assert!(ledger.check_balance_consistency(account.id).unwrap());
    }
}
