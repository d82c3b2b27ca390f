// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet and transaction-log tables.
//!
//! ## Table Layout
//!
//! - `wallets`: email → serialized StoredWallet (JSON bytes)
//! - `transactions`: record id → serialized StoredTransaction (JSON bytes)
//! - `email_tx_index`: composite key (email|!timestamp|id) → record id
//!
//! The wallet table enforces email uniqueness at insert time. The
//! transaction log is append-only; records are never mutated or deleted.
//! Multi-record writes (the two legs of a peer transfer, or a conversion's
//! balance credit plus log record) commit in a single redb write transaction.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, Table, TableDefinition};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::password::verify_password;
use super::{StorageError, StorageResult};
use crate::models::{Asset, FiatCurrency, TransactionType};

/// Primary wallet table: email → serialized StoredWallet.
const WALLETS: TableDefinition<&str, &[u8]> = TableDefinition::new("wallets");

/// Transaction log: record id → serialized StoredTransaction.
const TRANSACTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("transactions");

/// Index: composite key `email|!timestamp_be|id` → record id.
/// The inverted timestamp yields newest-first ordering on forward scans.
const EMAIL_TX_INDEX: TableDefinition<&[u8], &str> = TableDefinition::new("email_tx_index");

/// Fiat balance assigned when the field is absent from a stored record.
pub const DEFAULT_FIAT_BALANCE: f64 = 10000.0;

fn default_fiat_balance() -> f64 {
    DEFAULT_FIAT_BALANCE
}

/// A wallet record, one per user, keyed by email.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredWallet {
    /// Display name of the user.
    pub name: String,
    /// Unique email; primary key.
    pub email: String,
    /// Salted password hash (`salt$mac`, see `storage::password`).
    pub password_hash: String,
    /// Off-chain INR balance.
    #[serde(default = "default_fiat_balance")]
    pub fiat_balance: f64,
    /// On-ledger address per crypto asset plus the synthetic fiat address.
    pub wallet_addresses: BTreeMap<Asset, String>,
    /// Signing secret per asset; `None` for the fiat pseudo-asset.
    pub wallet_secrets: BTreeMap<Asset, Option<String>>,
    /// Set once at creation, immutable thereafter.
    pub created_at: DateTime<Utc>,
}

/// One leg of the append-only transaction log.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredTransaction {
    /// Unique record id (UUID).
    pub id: String,
    /// Email of the record's owner.
    pub email: String,
    /// Counterparty email for sent/received legs; `None` for conversions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
    /// Transferred amount in the record's asset.
    pub amount: f64,
    /// Asset the leg moved.
    pub asset: Asset,
    /// Direction of this leg.
    pub transaction_type: TransactionType,
    /// Ledger hash for crypto, generated identifier for fiat.
    pub transaction_hash: String,
    /// Server-assigned timestamp.
    pub timestamp: DateTime<Utc>,
    /// Target currency of a conversion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_currency: Option<FiatCurrency>,
    /// Fiat value before the fee, conversions only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_value: Option<f64>,
    /// Credited fiat value after the fee, conversions only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_value_after_fee: Option<f64>,
    /// Fee percentage applied, conversions only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_percentage: Option<f64>,
}

impl StoredTransaction {
    /// Construct a sent/received transfer leg with a fresh id and timestamp.
    pub fn transfer_leg(
        email: &str,
        counterparty: &str,
        amount: f64,
        asset: Asset,
        transaction_type: TransactionType,
        transaction_hash: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            counterparty: Some(counterparty.to_string()),
            amount,
            asset,
            transaction_type,
            transaction_hash: transaction_hash.to_string(),
            timestamp: Utc::now(),
            target_currency: None,
            gross_value: None,
            net_value_after_fee: None,
            fee_percentage: None,
        }
    }

    /// Construct a conversion settlement record.
    pub fn conversion(
        email: &str,
        amount_crypto: f64,
        asset: Asset,
        target_currency: FiatCurrency,
        gross_value: f64,
        net_value_after_fee: f64,
        fee_percentage: f64,
        transaction_hash: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            counterparty: None,
            amount: amount_crypto,
            asset,
            transaction_type: TransactionType::Convert,
            transaction_hash: transaction_hash.to_string(),
            timestamp: Utc::now(),
            target_currency: Some(target_currency),
            gross_value: Some(gross_value),
            net_value_after_fee: Some(net_value_after_fee),
            fee_percentage: Some(fee_percentage),
        }
    }
}

/// Build a composite key for the email_tx_index table.
///
/// Format: `email | inverted_timestamp_be_bytes | record_id`
fn make_index_key(email: &str, timestamp: i64, id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(email.len() + 1 + 8 + 1 + id.len());
    key.extend_from_slice(email.as_bytes());
    key.push(b'|');
    // Invert timestamp for descending order (newest first)
    key.extend_from_slice(&(!timestamp as u64).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(id.as_bytes());
    key
}

/// Build a prefix key for range scanning all records of one email.
fn make_prefix(email: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(email.len() + 1);
    prefix.extend_from_slice(email.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Upper bound for a prefix range scan.
fn make_prefix_end(email: &str) -> Vec<u8> {
    let mut end = make_prefix(email);
    end.extend_from_slice(&[0xFF; 20]);
    end
}

/// Embedded ACID wallet store.
pub struct WalletDatabase {
    db: Database,
}

impl WalletDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(WALLETS)?;
            let _ = write_txn.open_table(TRANSACTIONS)?;
            let _ = write_txn.open_table(EMAIL_TX_INDEX)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    // =========================================================================
    // Wallets
    // =========================================================================

    /// Insert a new wallet; email uniqueness is enforced here.
    pub fn insert_wallet(&self, wallet: &StoredWallet) -> StorageResult<()> {
        let json = serde_json::to_vec(wallet)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(WALLETS)?;
            if table.get(wallet.email.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "wallet {}",
                    wallet.email
                )));
            }
            table.insert(wallet.email.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a wallet by email.
    pub fn find_wallet(&self, email: &str) -> StorageResult<Option<StoredWallet>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WALLETS)?;
        match table.get(email)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Authenticate a user by email and password.
    ///
    /// The salted-hash comparison happens here, inside the store; callers
    /// never see the stored hash.
    pub fn authenticate(&self, email: &str, password: &str) -> StorageResult<StoredWallet> {
        let wallet = self
            .find_wallet(email)?
            .ok_or_else(|| StorageError::NotFound(format!("wallet {email}")))?;

        if verify_password(password, &wallet.password_hash) {
            Ok(wallet)
        } else {
            Err(StorageError::BadCredentials(email.to_string()))
        }
    }

    /// Find the wallet holding `address` for `asset`, if any.
    ///
    /// Full scan over the wallet table; used by the balance endpoint to
    /// resolve a btc address back to its owner's fiat balance.
    pub fn find_by_asset_address(
        &self,
        asset: Asset,
        address: &str,
    ) -> StorageResult<Option<StoredWallet>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WALLETS)?;
        for entry in table.iter()? {
            let (_, value) = entry?;
            let wallet: StoredWallet = serde_json::from_slice(value.value())?;
            if wallet.wallet_addresses.get(&asset).map(String::as_str) == Some(address) {
                return Ok(Some(wallet));
            }
        }
        Ok(None)
    }

    /// Overwrite a wallet's fiat balance.
    pub fn update_fiat_balance(&self, email: &str, new_balance: f64) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(WALLETS)?;
            let mut wallet: StoredWallet = match table.get(email)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(StorageError::NotFound(format!("wallet {email}"))),
            };
            wallet.fiat_balance = new_balance;
            let json = serde_json::to_vec(&wallet)?;
            table.insert(email, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    // =========================================================================
    // Transaction Log
    // =========================================================================

    /// Append a single log record.
    pub fn append_transaction(&self, record: &StoredTransaction) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut tx_table = write_txn.open_table(TRANSACTIONS)?;
            let mut idx_table = write_txn.open_table(EMAIL_TX_INDEX)?;
            append_leg(&mut tx_table, &mut idx_table, record)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Persist both legs of a peer transfer atomically.
    ///
    /// Either both the sender's `sent` leg and the receiver's `received` leg
    /// land, or neither does.
    pub fn record_transfer(
        &self,
        sent: &StoredTransaction,
        received: &StoredTransaction,
    ) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut tx_table = write_txn.open_table(TRANSACTIONS)?;
            let mut idx_table = write_txn.open_table(EMAIL_TX_INDEX)?;
            append_leg(&mut tx_table, &mut idx_table, sent)?;
            append_leg(&mut tx_table, &mut idx_table, received)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Credit a wallet's fiat balance and append the conversion record in one
    /// transaction.
    ///
    /// Returns the updated fiat balance.
    pub fn record_conversion(
        &self,
        email: &str,
        net_credit: f64,
        record: &StoredTransaction,
    ) -> StorageResult<f64> {
        let write_txn = self.db.begin_write()?;
        let updated_balance;
        {
            let mut wallets = write_txn.open_table(WALLETS)?;
            let mut wallet: StoredWallet = match wallets.get(email)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(StorageError::NotFound(format!("wallet {email}"))),
            };
            wallet.fiat_balance += net_credit;
            updated_balance = wallet.fiat_balance;
            let json = serde_json::to_vec(&wallet)?;
            wallets.insert(email, json.as_slice())?;

            let mut tx_table = write_txn.open_table(TRANSACTIONS)?;
            let mut idx_table = write_txn.open_table(EMAIL_TX_INDEX)?;
            append_leg(&mut tx_table, &mut idx_table, record)?;
        }
        write_txn.commit()?;
        Ok(updated_balance)
    }

    /// List all log records owned by `email`, newest first.
    pub fn list_transactions(&self, email: &str) -> StorageResult<Vec<StoredTransaction>> {
        let read_txn = self.db.begin_read()?;
        let idx_table = read_txn.open_table(EMAIL_TX_INDEX)?;
        let tx_table = read_txn.open_table(TRANSACTIONS)?;

        let prefix = make_prefix(email);
        let prefix_end = make_prefix_end(email);

        let mut records = Vec::new();
        for entry in idx_table.range(prefix.as_slice()..prefix_end.as_slice())? {
            let (_, id) = entry?;
            if let Some(value) = tx_table.get(id.value())? {
                records.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(records)
    }
}

fn append_leg(
    tx_table: &mut Table<'_, &str, &[u8]>,
    idx_table: &mut Table<'_, &[u8], &str>,
    record: &StoredTransaction,
) -> StorageResult<()> {
    let json = serde_json::to_vec(record)?;
    tx_table.insert(record.id.as_str(), json.as_slice())?;

    let key = make_index_key(&record.email, record.timestamp.timestamp(), &record.id);
    idx_table.insert(key.as_slice(), record.id.as_str())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::hash_password;

    fn test_db() -> (tempfile::TempDir, WalletDatabase) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db = WalletDatabase::open(&dir.path().join("wallets.redb")).expect("open db");
        (dir, db)
    }

    fn sample_wallet(email: &str) -> StoredWallet {
        let mut wallet_addresses = BTreeMap::new();
        let mut wallet_secrets = BTreeMap::new();
        for asset in Asset::CRYPTO {
            wallet_addresses.insert(asset, format!("0xaddr-{}-{email}", asset.code()));
            wallet_secrets.insert(asset, Some(format!("secret-{}", asset.code())));
        }
        wallet_addresses.insert(Asset::Inr, format!("inr_wallet_for_{email}"));
        wallet_secrets.insert(Asset::Inr, None);

        StoredWallet {
            name: "Asha".to_string(),
            email: email.to_string(),
            password_hash: hash_password("pw"),
            fiat_balance: DEFAULT_FIAT_BALANCE,
            wallet_addresses,
            wallet_secrets,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_find_wallet() {
        let (_dir, db) = test_db();
        let wallet = sample_wallet("a@example.com");

        db.insert_wallet(&wallet).unwrap();
        let loaded = db.find_wallet("a@example.com").unwrap().unwrap();
        assert_eq!(loaded.name, "Asha");
        assert_eq!(loaded.fiat_balance, DEFAULT_FIAT_BALANCE);
        assert!(db.find_wallet("b@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_conflicts() {
        let (_dir, db) = test_db();
        let wallet = sample_wallet("a@example.com");

        db.insert_wallet(&wallet).unwrap();
        let err = db.insert_wallet(&wallet).unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[test]
    fn authenticate_checks_password_in_store() {
        let (_dir, db) = test_db();
        db.insert_wallet(&sample_wallet("a@example.com")).unwrap();

        assert!(db.authenticate("a@example.com", "pw").is_ok());
        assert!(matches!(
            db.authenticate("a@example.com", "wrong"),
            Err(StorageError::BadCredentials(_))
        ));
        assert!(matches!(
            db.authenticate("nobody@example.com", "pw"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn find_by_asset_address_matches_btc_entry() {
        let (_dir, db) = test_db();
        db.insert_wallet(&sample_wallet("a@example.com")).unwrap();

        let found = db
            .find_by_asset_address(Asset::Btc, "0xaddr-btc-a@example.com")
            .unwrap();
        assert_eq!(found.unwrap().email, "a@example.com");

        let missing = db.find_by_asset_address(Asset::Btc, "0xnope").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn record_transfer_writes_both_legs_with_one_hash() {
        let (_dir, db) = test_db();
        db.insert_wallet(&sample_wallet("a@example.com")).unwrap();
        db.insert_wallet(&sample_wallet("b@example.com")).unwrap();

        let hash = "hash-123";
        let sent = StoredTransaction::transfer_leg(
            "a@example.com",
            "b@example.com",
            500.0,
            Asset::Inr,
            TransactionType::Sent,
            hash,
        );
        let received = StoredTransaction::transfer_leg(
            "b@example.com",
            "a@example.com",
            500.0,
            Asset::Inr,
            TransactionType::Received,
            hash,
        );
        db.record_transfer(&sent, &received).unwrap();

        let sender_log = db.list_transactions("a@example.com").unwrap();
        let receiver_log = db.list_transactions("b@example.com").unwrap();
        assert_eq!(sender_log.len(), 1);
        assert_eq!(receiver_log.len(), 1);
        assert_eq!(sender_log[0].transaction_hash, hash);
        assert_eq!(receiver_log[0].transaction_hash, hash);
        assert_eq!(sender_log[0].transaction_type, TransactionType::Sent);
        assert_eq!(receiver_log[0].transaction_type, TransactionType::Received);
    }

    #[test]
    fn record_conversion_credits_balance_and_appends_log() {
        let (_dir, db) = test_db();
        db.insert_wallet(&sample_wallet("a@example.com")).unwrap();

        let record = StoredTransaction::conversion(
            "a@example.com",
            0.01,
            Asset::Btc,
            FiatCurrency::Inr,
            50000.0,
            48750.0,
            2.5,
            "hash-xyz",
        );
        let balance = db
            .record_conversion("a@example.com", 48750.0, &record)
            .unwrap();
        assert_eq!(balance, DEFAULT_FIAT_BALANCE + 48750.0);

        let reloaded = db.find_wallet("a@example.com").unwrap().unwrap();
        assert_eq!(reloaded.fiat_balance, DEFAULT_FIAT_BALANCE + 48750.0);

        let log = db.list_transactions("a@example.com").unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].net_value_after_fee, Some(48750.0));
        assert_eq!(log[0].transaction_type, TransactionType::Convert);
    }

    #[test]
    fn list_transactions_is_scoped_to_owner() {
        let (_dir, db) = test_db();
        let leg = StoredTransaction::transfer_leg(
            "a@example.com",
            "b@example.com",
            1.0,
            Asset::Inr,
            TransactionType::Sent,
            "h",
        );
        db.append_transaction(&leg).unwrap();

        assert_eq!(db.list_transactions("a@example.com").unwrap().len(), 1);
        assert!(db.list_transactions("b@example.com").unwrap().is_empty());
    }

    #[test]
    fn list_transactions_returns_newest_first() {
        let (_dir, db) = test_db();
        let mut older = StoredTransaction::transfer_leg(
            "a@example.com",
            "b@example.com",
            1.0,
            Asset::Btc,
            TransactionType::Sent,
            "h1",
        );
        older.timestamp = Utc::now() - chrono::Duration::seconds(60);
        let newer = StoredTransaction::transfer_leg(
            "a@example.com",
            "b@example.com",
            2.0,
            Asset::Btc,
            TransactionType::Sent,
            "h2",
        );

        db.append_transaction(&older).unwrap();
        db.append_transaction(&newer).unwrap();

        let log = db.list_transactions("a@example.com").unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].transaction_hash, "h2");
        assert_eq!(log[1].transaction_hash, "h1");
    }

    #[test]
    fn update_fiat_balance_overwrites_value() {
        let (_dir, db) = test_db();
        db.insert_wallet(&sample_wallet("a@example.com")).unwrap();

        db.update_fiat_balance("a@example.com", 250.0).unwrap();
        let wallet = db.find_wallet("a@example.com").unwrap().unwrap();
        assert_eq!(wallet.fiat_balance, 250.0);

        assert!(matches!(
            db.update_fiat_balance("nobody@example.com", 1.0),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn fiat_balance_defaults_when_field_absent() {
        // Records written before the fiat ledger existed lack the field.
        let json = serde_json::json!({
            "name": "Asha",
            "email": "a@example.com",
            "password_hash": "x$y",
            "wallet_addresses": {},
            "wallet_secrets": {},
            "created_at": Utc::now(),
        });
        let wallet: StoredWallet = serde_json::from_value(json).unwrap();
        assert_eq!(wallet.fiat_balance, DEFAULT_FIAT_BALANCE);
    }
}
