//! Unique identifier generation
//!
//! Account numbers, routing codes, and transaction references are short
//! human-facing strings: a fixed prefix, a second-resolution timestamp,
//! and a random suffix. Uniqueness is enforced against the store's
//! indices with a bounded regenerate-and-retry loop; exhausting the
//! retry budget surfaces [`Error::IdentifierExhausted`], which in
//! practice signals a collision-space bug rather than bad luck.
//!
//! Generation is safe under concurrent calls without any account lock;
//! the retry loop is the only coordination.

use crate::{
    error::{Error, Result},
    store::Store,
    types::{AccountNumber, RoutingCode, TransactionId},
};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;

const ACCOUNT_PREFIX: &str = "NTB";
const TRANSACTION_PREFIX: &str = "TXN";
const ACCOUNT_NUMBER_WIDTH: usize = 16;
const UPPER_ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const UPPER_ALPHA: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generator for the three identifier families
pub struct IdGenerator {
    store: Arc<Store>,
    max_attempts: u32,
}

impl IdGenerator {
    /// Create a generator bound to the store's uniqueness indices
    pub fn new(store: Arc<Store>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts,
        }
    }

    /// Generate a unique account number:
    /// prefix + `%y%m%d%H%M%S` timestamp + 4 random digits, 16 chars.
    pub fn account_number(&self) -> Result<AccountNumber> {
        for _ in 0..self.max_attempts {
            let candidate = Self::candidate_account_number();
            if !self.store.account_number_exists(candidate.as_str())? {
                return Ok(candidate);
            }
        }
        Err(Error::IdentifierExhausted(self.max_attempts))
    }

    /// Generate a unique routing code:
    /// prefix + digit + three uppercase letters + digit.
    pub fn routing_code(&self) -> Result<RoutingCode> {
        for _ in 0..self.max_attempts {
            let candidate = Self::candidate_routing_code();
            if !self.store.routing_code_exists(candidate.as_str())? {
                return Ok(candidate);
            }
        }
        Err(Error::IdentifierExhausted(self.max_attempts))
    }

    /// Generate a unique transaction reference:
    /// prefix + `%y%m%d%H%M%S` timestamp + 6 random uppercase alphanumerics.
    pub fn transaction_id(&self) -> Result<TransactionId> {
        for _ in 0..self.max_attempts {
            let candidate = Self::candidate_transaction_id();
            if !self.store.transaction_ref_exists(candidate.as_str())? {
                return Ok(candidate);
            }
        }
        Err(Error::IdentifierExhausted(self.max_attempts))
    }

    fn candidate_account_number() -> AccountNumber {
        let timestamp = Utc::now().format("%y%m%d%H%M%S");
        let mut rng = rand::thread_rng();
        let suffix: String = (0..4)
            .map(|_| char::from(b'0' + rng.gen_range(0u8..10)))
            .collect();
        let mut number = format!("{ACCOUNT_PREFIX}{timestamp}{suffix}");
        number.truncate(ACCOUNT_NUMBER_WIDTH);
        AccountNumber::new(number)
    }

    fn candidate_routing_code() -> RoutingCode {
        let mut rng = rand::thread_rng();
        let digit = |rng: &mut rand::rngs::ThreadRng| char::from(b'0' + rng.gen_range(0u8..10));
        let letter = |rng: &mut rand::rngs::ThreadRng| {
            char::from(UPPER_ALPHA[rng.gen_range(0..UPPER_ALPHA.len())])
        };
        RoutingCode::new(format!(
            "{ACCOUNT_PREFIX}{}{}{}{}{}",
            digit(&mut rng),
            letter(&mut rng),
            letter(&mut rng),
            letter(&mut rng),
            digit(&mut rng),
        ))
    }

    fn candidate_transaction_id() -> TransactionId {
        let timestamp = Utc::now().format("%y%m%d%H%M%S");
        let mut rng = rand::thread_rng();
        let suffix: String = (0..6)
            .map(|_| char::from(UPPER_ALNUM[rng.gen_range(0..UPPER_ALNUM.len())]))
            .collect();
        TransactionId::new(format!("{TRANSACTION_PREFIX}{timestamp}{suffix}"))
    }
}
