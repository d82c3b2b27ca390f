// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet creation and authenticated access.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use tokio::task::JoinSet;
use tracing::info;

use crate::{
    error::ApiError,
    ledger::LedgerClient,
    models::{
        AccessWalletRequest, AccessWalletResponse, Asset, CreateWalletRequest,
        CreateWalletResponse,
    },
    rates::AssetQuote,
    state::AppState,
    storage::{hash_password, StorageError, StoredWallet},
};

/// Total INR-equivalent allocation spread across the crypto sub-accounts.
const TOTAL_FUNDING_INR: f64 = 30000.0;

/// Native coins held back on each sub-account to cover gas.
const GAS_RESERVE: f64 = 0.05;

/// Per-asset funding targets: the INR total split equally, valued at the
/// current reference price.
fn allocation_targets(quotes: &BTreeMap<Asset, AssetQuote>) -> BTreeMap<Asset, f64> {
    let per_asset_inr = TOTAL_FUNDING_INR / Asset::CRYPTO.len() as f64;
    Asset::CRYPTO
        .iter()
        .filter_map(|asset| {
            quotes
                .get(asset)
                .map(|quote| (*asset, round7(per_asset_inr / quote.price_inr)))
        })
        .collect()
}

fn round7(value: f64) -> f64 {
    (value * 1e7).round() / 1e7
}

/// Provision one crypto sub-account: generate a keypair, pull faucet funds,
/// then skim everything above the target allocation back to the house
/// account.
async fn provision_account(
    ledger: Arc<LedgerClient>,
    house_address: String,
    asset: Asset,
    target_amount: f64,
) -> Result<(Asset, String, String), String> {
    let (address, secret) = LedgerClient::create_account();

    ledger
        .fund(&address)
        .await
        .map_err(|e| format!("Failed to fund {} wallet: {e}", asset.code()))?;

    let funded = ledger.get_balance(&address).await;
    let excess = round7(funded - target_amount - GAS_RESERVE);
    if excess > 0.0 {
        ledger
            .pay(&secret, &house_address, excess)
            .await
            .map_err(|e| format!("Failed to skim excess from {} wallet: {e}", asset.code()))?;
    }

    Ok((asset, address, secret))
}

/// Create a wallet: one funded ledger sub-account per crypto asset plus the
/// fiat pseudo-wallet.
///
/// The three sub-accounts are provisioned concurrently; any failure fails
/// the whole creation. Already-funded sub-accounts are not rolled back.
#[utoipa::path(
    post,
    path = "/create_wallet",
    tag = "Wallets",
    request_body = CreateWalletRequest,
    responses(
        (status = 201, description = "Wallet created", body = CreateWalletResponse),
        (status = 400, description = "Missing name, email, or password"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Provisioning failed")
    )
)]
pub async fn create_wallet(
    State(state): State<AppState>,
    Json(request): Json<CreateWalletRequest>,
) -> Result<(StatusCode, Json<CreateWalletResponse>), ApiError> {
    if request.name.trim().is_empty()
        || request.email.trim().is_empty()
        || request.password.is_empty()
    {
        return Err(ApiError::bad_request(
            "Name, email, and password are required",
        ));
    }

    let existing = state
        .db
        .find_wallet(&request.email)
        .map_err(|e| ApiError::internal(format!("Failed to access wallet store: {e}")))?;
    if existing.is_some() {
        return Err(ApiError::conflict("Email already registered"));
    }

    let quotes = state
        .feed
        .crypto_data()
        .await
        .map_err(|e| ApiError::service_unavailable(e.to_string()))?;
    let targets = allocation_targets(&quotes);

    let mut tasks = JoinSet::new();
    for asset in Asset::CRYPTO {
        let ledger = Arc::clone(&state.ledger);
        let house = state.config.house_account_address.clone();
        let target = targets.get(&asset).copied().unwrap_or(0.0);
        tasks.spawn(provision_account(ledger, house, asset, target));
    }

    let mut wallet_addresses = BTreeMap::new();
    let mut wallet_secrets = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        let provisioned = joined
            .map_err(|e| ApiError::internal(format!("Wallet provisioning task failed: {e}")))?;
        let (asset, address, secret) = provisioned.map_err(ApiError::internal)?;
        wallet_addresses.insert(asset, address);
        wallet_secrets.insert(asset, Some(secret));
    }

    wallet_addresses.insert(Asset::Inr, fiat_address(&request.email));
    wallet_secrets.insert(Asset::Inr, None);

    let wallet = StoredWallet {
        name: request.name,
        email: request.email,
        password_hash: hash_password(&request.password),
        fiat_balance: crate::storage::DEFAULT_FIAT_BALANCE,
        wallet_addresses: wallet_addresses.clone(),
        wallet_secrets,
        created_at: Utc::now(),
    };

    state.db.insert_wallet(&wallet).map_err(|e| match e {
        StorageError::AlreadyExists(_) => ApiError::conflict("Email already registered"),
        other => ApiError::internal(format!("Failed to persist wallet: {other}")),
    })?;

    info!("created wallet for {}", wallet.email);

    Ok((
        StatusCode::CREATED,
        Json(CreateWalletResponse {
            message: "Wallet created successfully".to_string(),
            wallet_addresses,
        }),
    ))
}

/// Authenticate and return the full wallet view, secrets included.
///
/// Wallets created before the fiat ledger existed get their fiat entry
/// backfilled in the response without being persisted.
#[utoipa::path(
    post,
    path = "/access",
    tag = "Wallets",
    request_body = AccessWalletRequest,
    responses(
        (status = 200, description = "Wallet contents", body = AccessWalletResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid password"),
        (status = 404, description = "Wallet not found")
    )
)]
pub async fn access_wallet(
    State(state): State<AppState>,
    Json(request): Json<AccessWalletRequest>,
) -> Result<Json<AccessWalletResponse>, ApiError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let wallet = state
        .db
        .authenticate(&request.email, &request.password)
        .map_err(|e| match e {
            StorageError::NotFound(_) => ApiError::not_found("Wallet not found"),
            StorageError::BadCredentials(_) => ApiError::unauthorized("Invalid password"),
            other => ApiError::internal(format!("Failed to access wallet store: {other}")),
        })?;

    let mut wallet_addresses = wallet.wallet_addresses;
    let mut wallet_secrets = wallet.wallet_secrets;
    if !wallet_addresses.contains_key(&Asset::Inr) {
        wallet_addresses.insert(Asset::Inr, fiat_address(&wallet.email));
        wallet_secrets.insert(Asset::Inr, None);
    }

    Ok(Json(AccessWalletResponse {
        name: wallet.name,
        email: wallet.email,
        wallet_addresses,
        wallet_secrets,
    }))
}

/// Synthetic address of the off-chain fiat pseudo-wallet.
pub fn fiat_address(email: &str) -> String {
    format!("inr_wallet_for_{email}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(price_inr: f64) -> AssetQuote {
        AssetQuote {
            price_inr,
            change_24h: 0.0,
        }
    }

    #[test]
    fn allocation_splits_total_equally_at_reference_prices() {
        let mut quotes = BTreeMap::new();
        quotes.insert(Asset::Btc, quote(5_000_000.0));
        quotes.insert(Asset::Eth, quote(250_000.0));
        quotes.insert(Asset::Sol, quote(10_000.0));

        let targets = allocation_targets(&quotes);
        assert_eq!(targets[&Asset::Btc], 0.002);
        assert_eq!(targets[&Asset::Eth], 0.04);
        assert_eq!(targets[&Asset::Sol], 1.0);
    }

    #[test]
    fn fiat_address_embeds_email() {
        assert_eq!(
            fiat_address("a@example.com"),
            "inr_wallet_for_a@example.com"
        );
    }
}
