// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Peer-to-peer transfers between wallets.

use axum::{extract::State, Json};
use tracing::{error, info};

use crate::{
    error::ApiError,
    models::{Asset, SendPaymentRequest, SendPaymentResponse, TransactionType},
    state::AppState,
    storage::{StorageError, StoredTransaction},
};

/// Transfer an asset from one custodial wallet to another.
///
/// Crypto transfers settle on the ledger first; fiat transfers synthesize
/// an opaque transaction identifier without a network call. Either way the
/// sent and received log legs are then written atomically, both carrying
/// the same hash. Fiat balances are never mutated by a transfer.
#[utoipa::path(
    post,
    path = "/send",
    tag = "Payments",
    request_body = SendPaymentRequest,
    responses(
        (status = 200, description = "Payment settled", body = SendPaymentResponse),
        (status = 400, description = "Missing parameters or unsupported wallet type"),
        (status = 401, description = "Incorrect password"),
        (status = 404, description = "Sender or receiver not found"),
        (status = 500, description = "Ledger payment failed")
    )
)]
pub async fn send_payment(
    State(state): State<AppState>,
    Json(request): Json<SendPaymentRequest>,
) -> Result<Json<SendPaymentResponse>, ApiError> {
    if request.sender_email.trim().is_empty()
        || request.password.is_empty()
        || request.destination_email.trim().is_empty()
        || request.wallet_type.trim().is_empty()
    {
        return Err(ApiError::bad_request("Missing required parameters"));
    }
    if !(request.amount > 0.0) || !request.amount.is_finite() {
        return Err(ApiError::bad_request("Amount must be positive"));
    }

    let asset = Asset::parse(&request.wallet_type).ok_or_else(|| {
        ApiError::bad_request(format!("Unsupported wallet type: {}", request.wallet_type))
    })?;

    let sender = state
        .db
        .authenticate(&request.sender_email, &request.password)
        .map_err(|e| match e {
            StorageError::NotFound(_) => ApiError::not_found("Sender not found"),
            StorageError::BadCredentials(_) => ApiError::unauthorized("Incorrect password"),
            other => ApiError::internal(format!("Failed to access wallet store: {other}")),
        })?;

    let receiver = state
        .db
        .find_wallet(&request.destination_email)
        .map_err(|e| ApiError::internal(format!("Failed to access wallet store: {e}")))?
        .ok_or_else(|| ApiError::not_found("Receiver not found"))?;

    let receiver_address = receiver
        .wallet_addresses
        .get(&asset)
        .cloned()
        .ok_or_else(|| {
            ApiError::not_found(format!("Receiver does not have a {} wallet", asset.code()))
        })?;

    let transaction_hash = if asset.is_fiat() {
        // Off-chain transfer; the log legs are the only record.
        format!("fiat-{}", uuid::Uuid::new_v4().simple())
    } else {
        let sender_secret = sender
            .wallet_secrets
            .get(&asset)
            .and_then(Clone::clone)
            .ok_or_else(|| {
                ApiError::not_found(format!("Sender does not have a {} wallet", asset.code()))
            })?;

        state
            .ledger
            .pay(&sender_secret, &receiver_address, request.amount)
            .await
            .map_err(|e| {
                error!(
                    asset = asset.code(),
                    sender = %sender.email,
                    "ledger payment failed: {e}"
                );
                ApiError::internal("Transaction failed")
            })?
    };

    let sent = StoredTransaction::transfer_leg(
        &sender.email,
        &receiver.email,
        request.amount,
        asset,
        TransactionType::Sent,
        &transaction_hash,
    );
    let received = StoredTransaction::transfer_leg(
        &receiver.email,
        &sender.email,
        request.amount,
        asset,
        TransactionType::Received,
        &transaction_hash,
    );
    state
        .db
        .record_transfer(&sent, &received)
        .map_err(|e| ApiError::internal(format!("Failed to record transfer: {e}")))?;

    if asset.is_fiat() {
        info!(amount = request.amount, hash = %transaction_hash, "fiat payment recorded");
    } else {
        info!(
            asset = asset.code(),
            amount = request.amount,
            explorer = %state.ledger.explorer_tx_url(&transaction_hash),
            "payment settled"
        );
    }

    Ok(Json(SendPaymentResponse {
        message: "Payment sent successfully".to_string(),
        transaction_hash,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        ledger::{LedgerClient, LedgerNetwork},
        models::TransactionType,
        rates::PriceFeed,
        storage::{hash_password, StoredWallet, WalletDatabase, DEFAULT_FIAT_BALANCE},
    };
    use axum::extract::State;
    use axum::http::StatusCode;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn test_state(dir: &std::path::Path) -> AppState {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            data_dir: dir.to_path_buf(),
            rpc_url: "http://127.0.0.1:8545".to_string(),
            chain_id: 43113,
            faucet_url: "http://127.0.0.1:9000/fund".to_string(),
            explorer_url: "https://testnet.snowtrace.io".to_string(),
            house_account_address: "0x0000000000000000000000000000000000000001".to_string(),
            exchange_api_key: "test-key".to_string(),
            exchange_api_base_url: "http://127.0.0.1:9001/v6".to_string(),
            price_feed_base_url: "http://127.0.0.1:9002/api/v3".to_string(),
        };
        let db = WalletDatabase::open(&config.database_path()).unwrap();
        let ledger = LedgerClient::new(LedgerNetwork {
            name: "local".to_string(),
            chain_id: config.chain_id,
            rpc_url: config.rpc_url.clone(),
            faucet_url: config.faucet_url.clone(),
            explorer_url: config.explorer_url.clone(),
        })
        .unwrap();
        let feed = PriceFeed::new(
            config.price_feed_base_url.clone(),
            config.exchange_api_base_url.clone(),
            config.exchange_api_key.clone(),
        );
        AppState::new(db, ledger, feed, config)
    }

    fn seed_wallet(state: &AppState, email: &str) {
        let mut wallet_addresses = BTreeMap::new();
        let mut wallet_secrets = BTreeMap::new();
        for asset in Asset::CRYPTO {
            wallet_addresses.insert(asset, format!("0xaddr-{}-{email}", asset.code()));
            wallet_secrets.insert(asset, Some("00".repeat(32)));
        }
        wallet_addresses.insert(Asset::Inr, format!("inr_wallet_for_{email}"));
        wallet_secrets.insert(Asset::Inr, None);

        state
            .db
            .insert_wallet(&StoredWallet {
                name: "Asha".to_string(),
                email: email.to_string(),
                password_hash: hash_password("pw"),
                fiat_balance: DEFAULT_FIAT_BALANCE,
                wallet_addresses,
                wallet_secrets,
                created_at: Utc::now(),
            })
            .unwrap();
    }

    fn seed_fiat_only_wallet(state: &AppState, email: &str) {
        let mut wallet_addresses = BTreeMap::new();
        let mut wallet_secrets = BTreeMap::new();
        wallet_addresses.insert(Asset::Inr, format!("inr_wallet_for_{email}"));
        wallet_secrets.insert(Asset::Inr, None);

        state
            .db
            .insert_wallet(&StoredWallet {
                name: "Ravi".to_string(),
                email: email.to_string(),
                password_hash: hash_password("pw"),
                fiat_balance: DEFAULT_FIAT_BALANCE,
                wallet_addresses,
                wallet_secrets,
                created_at: Utc::now(),
            })
            .unwrap();
    }

    fn send_request(dest: &str, wallet_type: &str) -> SendPaymentRequest {
        SendPaymentRequest {
            sender_email: "a@example.com".to_string(),
            password: "pw".to_string(),
            destination_email: dest.to_string(),
            amount: 500.0,
            wallet_type: wallet_type.to_string(),
        }
    }

    #[tokio::test]
    async fn fiat_send_writes_two_legs_and_leaves_balances_alone() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        seed_wallet(&state, "a@example.com");
        seed_wallet(&state, "b@example.com");

        let axum::Json(response) = send_payment(
            State(state.clone()),
            axum::Json(send_request("b@example.com", "inr")),
        )
        .await
        .unwrap();
        assert_eq!(response.message, "Payment sent successfully");
        assert!(response.transaction_hash.starts_with("fiat-"));

        let sender_log = state.db.list_transactions("a@example.com").unwrap();
        let receiver_log = state.db.list_transactions("b@example.com").unwrap();
        assert_eq!(sender_log.len(), 1);
        assert_eq!(receiver_log.len(), 1);
        assert_eq!(sender_log[0].transaction_type, TransactionType::Sent);
        assert_eq!(receiver_log[0].transaction_type, TransactionType::Received);
        assert_eq!(
            sender_log[0].transaction_hash,
            receiver_log[0].transaction_hash
        );

        // Transfers do not touch the off-chain balances.
        let sender = state.db.find_wallet("a@example.com").unwrap().unwrap();
        let receiver = state.db.find_wallet("b@example.com").unwrap().unwrap();
        assert_eq!(sender.fiat_balance, DEFAULT_FIAT_BALANCE);
        assert_eq!(receiver.fiat_balance, DEFAULT_FIAT_BALANCE);
    }

    #[tokio::test]
    async fn unknown_receiver_writes_no_log_entries() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        seed_wallet(&state, "a@example.com");

        let err = send_payment(
            State(state.clone()),
            axum::Json(send_request("nobody@example.com", "inr")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Receiver not found");

        assert!(state.db.list_transactions("a@example.com").unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_asset_wallet_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        seed_wallet(&state, "a@example.com");
        seed_fiat_only_wallet(&state, "b@example.com");

        let err = send_payment(
            State(state.clone()),
            axum::Json(send_request("b@example.com", "eth")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Receiver does not have a eth wallet");

        // Same status when the sender side lacks the sub-account.
        seed_fiat_only_wallet(&state, "c@example.com");
        let mut request = send_request("a@example.com", "eth");
        request.sender_email = "c@example.com".to_string();
        let err = send_payment(State(state.clone()), axum::Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Sender does not have a eth wallet");

        assert!(state.db.list_transactions("a@example.com").unwrap().is_empty());
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        seed_wallet(&state, "a@example.com");
        seed_wallet(&state, "b@example.com");

        let mut request = send_request("b@example.com", "inr");
        request.password = "wrong".to_string();
        let err = send_payment(State(state), axum::Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "Incorrect password");
    }

    #[tokio::test]
    async fn missing_parameters_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let mut request = send_request("b@example.com", "inr");
        request.sender_email = String::new();
        let err = send_payment(State(state.clone()), axum::Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Missing required parameters");

        let mut request = send_request("b@example.com", "inr");
        request.amount = -5.0;
        let err = send_payment(State(state), axum::Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Amount must be positive");
    }
}
