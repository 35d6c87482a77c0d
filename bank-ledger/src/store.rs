//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `accounts` - Account records (key: account id)
//! - `policies` - Account-type policies (key: policy id)
//! - `transactions` - Append-mostly transaction records (key: transaction id)
//! - `interest` - Interest accrual records (key: record id)
//! - `indices` - Uniqueness and per-account ordering indices
//!
//! # Indices
//!
//! - `an|<number>` -> account uuid (account number uniqueness + lookup)
//! - `rc|<code>` -> account uuid (routing code uniqueness)
//! - `tx|<reference>` -> transaction uuid (transaction reference uniqueness)
//! - `at|<account uuid><created_at nanos BE><txn uuid>` -> empty
//!   (per-account, creation-time-ordered transaction walk)
//! - `ai|<account uuid><credited_at nanos BE><record uuid>` -> empty
//!
//! Every multi-record effect (balance write + transaction record + indices)
//! commits through a single `WriteBatch`.

use crate::{
    config::Config,
    error::{Error, Result},
    types::{Account, AccountNumber, AccountPolicy, InterestRecord, Transaction, TransactionId},
};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, Direction, IteratorMode, Options,
    WriteBatch, DB,
};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_ACCOUNTS: &str = "accounts";
const CF_POLICIES: &str = "policies";
const CF_TRANSACTIONS: &str = "transactions";
const CF_INTEREST: &str = "interest";
const CF_INDICES: &str = "indices";

/// Storage wrapper for RocksDB
pub struct Store {
    db: Arc<DB>,
}

impl Store {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        // Universal compaction for the append-mostly transaction log
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Self::cf_options_hot()),
            ColumnFamilyDescriptor::new(CF_POLICIES, Self::cf_options_hot()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Self::cf_options_log()),
            ColumnFamilyDescriptor::new(CF_INTEREST, Self::cf_options_log()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_hot() -> Options {
        let mut opts = Options::default();
        // Frequently read and rewritten, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_log() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false); // 10 bits per key
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::StoreUnavailable(format!("Column family {} not found", name)))
    }

    // Index key helpers

    fn idx_account_number(number: &str) -> Vec<u8> {
        let mut key = b"an|".to_vec();
        key.extend_from_slice(number.as_bytes());
        key
    }

    fn idx_routing_code(code: &str) -> Vec<u8> {
        let mut key = b"rc|".to_vec();
        key.extend_from_slice(code.as_bytes());
        key
    }

    fn idx_transaction_ref(reference: &str) -> Vec<u8> {
        let mut key = b"tx|".to_vec();
        key.extend_from_slice(reference.as_bytes());
        key
    }

    fn idx_account_txn_prefix(account_id: &Uuid) -> Vec<u8> {
        let mut key = b"at|".to_vec();
        key.extend_from_slice(account_id.as_bytes());
        key
    }

    fn idx_account_txn(transaction: &Transaction) -> Vec<u8> {
        let mut key = Self::idx_account_txn_prefix(&transaction.account_id);
        let nanos = transaction.created_at.timestamp_nanos_opt().unwrap_or(0);
        key.extend_from_slice(&nanos.to_be_bytes());
        key.extend_from_slice(transaction.id.as_bytes());
        key
    }

    fn idx_account_interest_prefix(account_id: &Uuid) -> Vec<u8> {
        let mut key = b"ai|".to_vec();
        key.extend_from_slice(account_id.as_bytes());
        key
    }

    fn idx_account_interest(record: &InterestRecord) -> Vec<u8> {
        let mut key = Self::idx_account_interest_prefix(&record.account_id);
        let nanos = record.credited_at.timestamp_nanos_opt().unwrap_or(0);
        key.extend_from_slice(&nanos.to_be_bytes());
        key.extend_from_slice(record.id.as_bytes());
        key
    }

    fn uuid_from_index_value(value: &[u8]) -> Result<Uuid> {
        let bytes: [u8; 16] = value
            .try_into()
            .map_err(|_| Error::StoreUnavailable("Corrupt index value".to_string()))?;
        Ok(Uuid::from_bytes(bytes))
    }

    // Account operations

    /// Persist a newly opened account together with its uniqueness indices
    pub fn create_account(&self, account: &Account) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
        batch.put_cf(
            cf_accounts,
            account.id.as_bytes(),
            bincode::serialize(account)?,
        );

        let cf_indices = self.cf_handle(CF_INDICES)?;
        batch.put_cf(
            cf_indices,
            Self::idx_account_number(account.account_number.as_str()),
            account.id.as_bytes(),
        );
        batch.put_cf(
            cf_indices,
            Self::idx_routing_code(account.routing_code.as_str()),
            account.id.as_bytes(),
        );

        self.db.write(batch)?;

        tracing::debug!(
            account_id = %account.id,
            account_number = %account.account_number,
            "Account created"
        );

        Ok(())
    }

    /// Overwrite an account record (soft-state flips)
    pub fn put_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        self.db
            .put_cf(cf, account.id.as_bytes(), bincode::serialize(account)?)?;
        Ok(())
    }

    /// Get account by internal id
    pub fn get_account(&self, account_id: Uuid) -> Result<Account> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let value = self
            .db
            .get_cf(cf, account_id.as_bytes())?
            .ok_or(Error::AccountNotFound(account_id))?;
        Ok(bincode::deserialize(&value)?)
    }

    /// Get account by its customer-facing account number
    pub fn get_account_by_number(&self, number: &AccountNumber) -> Result<Option<Account>> {
        let cf_indices = self.cf_handle(CF_INDICES)?;
        match self
            .db
            .get_cf(cf_indices, Self::idx_account_number(number.as_str()))?
        {
            Some(value) => Ok(Some(
                self.get_account(Self::uuid_from_index_value(&value)?)?,
            )),
            None => Ok(None),
        }
    }

    /// All accounts, in key order. The accrual batch scans with this.
    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let mut accounts = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            accounts.push(bincode::deserialize(&value)?);
        }
        Ok(accounts)
    }

    // Uniqueness checks for identifier generation

    /// Whether an account number is already assigned
    pub fn account_number_exists(&self, number: &str) -> Result<bool> {
        let cf = self.cf_handle(CF_INDICES)?;
        Ok(self.db.get_cf(cf, Self::idx_account_number(number))?.is_some())
    }

    /// Whether a routing code is already assigned
    pub fn routing_code_exists(&self, code: &str) -> Result<bool> {
        let cf = self.cf_handle(CF_INDICES)?;
        Ok(self.db.get_cf(cf, Self::idx_routing_code(code))?.is_some())
    }

    /// Whether a transaction reference is already assigned
    pub fn transaction_ref_exists(&self, reference: &str) -> Result<bool> {
        let cf = self.cf_handle(CF_INDICES)?;
        Ok(self
            .db
            .get_cf(cf, Self::idx_transaction_ref(reference))?
            .is_some())
    }

    // Policy operations

    /// Create or update a policy
    pub fn put_policy(&self, policy: &AccountPolicy) -> Result<()> {
        let cf = self.cf_handle(CF_POLICIES)?;
        self.db
            .put_cf(cf, policy.id.as_bytes(), bincode::serialize(policy)?)?;
        Ok(())
    }

    /// Get policy by id
    pub fn get_policy(&self, policy_id: Uuid) -> Result<AccountPolicy> {
        let cf = self.cf_handle(CF_POLICIES)?;
        let value = self
            .db
            .get_cf(cf, policy_id.as_bytes())?
            .ok_or(Error::PolicyNotFound(policy_id))?;
        Ok(bincode::deserialize(&value)?)
    }

    /// All policies, in key order
    pub fn list_policies(&self) -> Result<Vec<AccountPolicy>> {
        let cf = self.cf_handle(CF_POLICIES)?;
        let mut policies = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            policies.push(bincode::deserialize(&value)?);
        }
        Ok(policies)
    }

    /// Delete a policy. Blocked while any account still references it.
    pub fn delete_policy(&self, policy_id: Uuid) -> Result<()> {
        self.get_policy(policy_id)?;

        let referenced = self
            .list_accounts()?
            .iter()
            .any(|account| account.policy_id == Some(policy_id));
        if referenced {
            return Err(Error::PolicyInUse(policy_id));
        }

        let cf = self.cf_handle(CF_POLICIES)?;
        self.db.delete_cf(cf, policy_id.as_bytes())?;
        Ok(())
    }

    // Transaction operations

    /// Get transaction by internal id
    pub fn get_transaction(&self, transaction_pk: Uuid) -> Result<Transaction> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        let value = self
            .db
            .get_cf(cf, transaction_pk.as_bytes())?
            .ok_or_else(|| Error::TransactionNotFound(transaction_pk.to_string()))?;
        Ok(bincode::deserialize(&value)?)
    }

    /// Get transaction by its customer-facing reference
    pub fn get_transaction_by_ref(&self, reference: &TransactionId) -> Result<Transaction> {
        let cf_indices = self.cf_handle(CF_INDICES)?;
        let value = self
            .db
            .get_cf(cf_indices, Self::idx_transaction_ref(reference.as_str()))?
            .ok_or_else(|| Error::TransactionNotFound(reference.to_string()))?;
        self.get_transaction(Self::uuid_from_index_value(&value)?)
    }

    /// Transaction history for one account, ordered by creation time
    pub fn account_transactions(&self, account_id: Uuid) -> Result<Vec<Transaction>> {
        let cf_indices = self.cf_handle(CF_INDICES)?;
        let prefix = Self::idx_account_txn_prefix(&account_id);

        let iter = self.db.iterator_cf(
            cf_indices,
            IteratorMode::From(&prefix, Direction::Forward),
        );

        let mut transactions = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            // Key layout: prefix (19) || nanos (8) || txn uuid (16)
            if key.len() >= prefix.len() + 8 + 16 {
                let id_bytes: [u8; 16] = key[prefix.len() + 8..prefix.len() + 24]
                    .try_into()
                    .map_err(|_| Error::StoreUnavailable("Corrupt index key".to_string()))?;
                transactions.push(self.get_transaction(Uuid::from_bytes(id_bytes))?);
            }
        }

        Ok(transactions)
    }

    /// Interest records for one account, ordered by credit time
    pub fn account_interest_records(&self, account_id: Uuid) -> Result<Vec<InterestRecord>> {
        let cf_indices = self.cf_handle(CF_INDICES)?;
        let cf_interest = self.cf_handle(CF_INTEREST)?;
        let prefix = Self::idx_account_interest_prefix(&account_id);

        let iter = self.db.iterator_cf(
            cf_indices,
            IteratorMode::From(&prefix, Direction::Forward),
        );

        let mut records = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            if key.len() >= prefix.len() + 8 + 16 {
                let id_bytes: [u8; 16] = key[prefix.len() + 8..prefix.len() + 24]
                    .try_into()
                    .map_err(|_| Error::StoreUnavailable("Corrupt index key".to_string()))?;
                let value = self
                    .db
                    .get_cf(cf_interest, id_bytes)?
                    .ok_or_else(|| Error::StoreUnavailable("Dangling interest index".to_string()))?;
                records.push(bincode::deserialize(&value)?);
            }
        }

        Ok(records)
    }

    // Atomic commit

    /// Commit one ledger entry: updated account records, transaction records
    /// with their indices, and an optional interest record, all-or-nothing.
    ///
    /// Re-putting an existing transaction (the rollback status flip) writes
    /// the same keys again and is safe.
    pub fn commit_atomic(
        &self,
        accounts: &[&Account],
        transactions: &[&Transaction],
        interest: Option<&InterestRecord>,
    ) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
        for account in accounts {
            batch.put_cf(
                cf_accounts,
                account.id.as_bytes(),
                bincode::serialize(account)?,
            );
        }

        let cf_transactions = self.cf_handle(CF_TRANSACTIONS)?;
        let cf_indices = self.cf_handle(CF_INDICES)?;
        for transaction in transactions {
            batch.put_cf(
                cf_transactions,
                transaction.id.as_bytes(),
                bincode::serialize(transaction)?,
            );
            batch.put_cf(
                cf_indices,
                Self::idx_transaction_ref(transaction.transaction_id.as_str()),
                transaction.id.as_bytes(),
            );
            batch.put_cf(cf_indices, Self::idx_account_txn(transaction), []);
        }

        if let Some(record) = interest {
            let cf_interest = self.cf_handle(CF_INTEREST)?;
            batch.put_cf(cf_interest, record.id.as_bytes(), bincode::serialize(record)?);
            batch.put_cf(cf_indices, Self::idx_account_interest(record), []);
        }

        self.db.write(batch)?;

        Ok(())
    }
}
