// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded wallet store backed by redb (pure Rust, ACID).
//!
//! - `db` - wallet and transaction-log tables plus transactional writes
//! - `password` - salted password hashing and verification

mod db;
mod password;

pub use db::{StoredTransaction, StoredWallet, WalletDatabase, DEFAULT_FIAT_BALANCE};
pub use password::{hash_password, verify_password};

/// Errors raised by the wallet store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid credentials for {0}")]
    BadCredentials(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
