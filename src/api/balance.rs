// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Aggregated balance inquiry across on-ledger and fiat holdings.

use std::collections::BTreeMap;

use axum::{extract::State, Json};

use crate::{
    error::ApiError,
    models::{Asset, AssetBalance, BalanceRequest, BalanceResponse},
    rates::{round2, AssetQuote},
    state::AppState,
    storage::DEFAULT_FIAT_BALANCE,
};

/// Per-asset balances plus their INR valuation at live prices.
///
/// Crypto balances come from the ledger; the fiat balance is resolved by
/// looking the btc address up in the wallet store and defaults to the seed
/// amount when no owner is found. A sub-account the ledger cannot reach
/// reports zero rather than failing the whole inquiry.
#[utoipa::path(
    post,
    path = "/balance",
    tag = "Balances",
    request_body = BalanceRequest,
    responses(
        (status = 200, description = "Per-asset balances", body = BalanceResponse),
        (status = 400, description = "Missing wallet addresses"),
        (status = 503, description = "Price feed unavailable")
    )
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Json(request): Json<BalanceRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let addresses = request.wallet_addresses;
    if addresses.btc.trim().is_empty()
        && addresses.eth.trim().is_empty()
        && addresses.sol.trim().is_empty()
    {
        return Err(ApiError::bad_request("Wallet addresses are required"));
    }

    let quotes = state
        .feed
        .crypto_data()
        .await
        .map_err(|e| ApiError::service_unavailable(e.to_string()))?;

    let mut crypto_balances = Vec::new();
    for (asset, address) in [
        (Asset::Btc, addresses.btc.as_str()),
        (Asset::Eth, addresses.eth.as_str()),
        (Asset::Sol, addresses.sol.as_str()),
    ] {
        if address.trim().is_empty() {
            continue;
        }
        crypto_balances.push((asset, state.ledger.get_balance(address).await));
    }

    let fiat_balance = match state
        .db
        .find_by_asset_address(Asset::Btc, &addresses.btc)
        .map_err(|e| ApiError::internal(format!("Failed to access wallet store: {e}")))?
    {
        Some(wallet) => wallet.fiat_balance,
        None => DEFAULT_FIAT_BALANCE,
    };

    Ok(Json(BalanceResponse {
        balances: assemble_balances(&crypto_balances, &quotes, fiat_balance),
    }))
}

/// Build the response map, keyed by uppercase ticker symbol.
fn assemble_balances(
    crypto_balances: &[(Asset, f64)],
    quotes: &BTreeMap<Asset, AssetQuote>,
    fiat_balance: f64,
) -> BTreeMap<String, AssetBalance> {
    let mut balances = BTreeMap::new();
    for &(asset, balance) in crypto_balances {
        let quote = quotes.get(&asset).copied().unwrap_or_default();
        balances.insert(
            asset.symbol().to_string(),
            AssetBalance {
                balance,
                price_inr: quote.price_inr,
                change_24h: round2(quote.change_24h),
                inr_value: round2(balance * quote.price_inr),
            },
        );
    }

    balances.insert(
        Asset::Inr.symbol().to_string(),
        AssetBalance {
            balance: fiat_balance,
            price_inr: 1.0,
            change_24h: 0.0,
            inr_value: round2(fiat_balance),
        },
    );
    balances
}
