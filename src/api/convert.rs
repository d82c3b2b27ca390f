// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Crypto-to-fiat conversion and live rate quotes.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use tracing::{error, info};

use crate::{
    error::ApiError,
    models::{
        Asset, ConvertRequest, ConvertResponse, FiatCurrency, LiveRatesRequest, LiveRatesResponse,
    },
    rates::{fiat_value, net_after_fee, round2, FEE_PERCENTAGE},
    state::AppState,
    storage::{StorageError, StoredTransaction},
};

/// Quote a conversion without settling it.
///
/// Returns the value of `amount` units of the asset in the target currency
/// at current rates, plus unit prices for all supported assets in that
/// currency. The settlement fee applies only when a conversion actually
/// settles via `/convert`.
#[utoipa::path(
    post,
    path = "/live-rates",
    tag = "Conversions",
    request_body = LiveRatesRequest,
    responses(
        (status = 200, description = "Current-rate quote", body = LiveRatesResponse),
        (status = 400, description = "Unsupported symbol or currency"),
        (status = 503, description = "Rate provider unavailable")
    )
)]
pub async fn live_rates(
    State(state): State<AppState>,
    Json(request): Json<LiveRatesRequest>,
) -> Result<Json<LiveRatesResponse>, ApiError> {
    if !(request.amount > 0.0) || !request.amount.is_finite() {
        return Err(ApiError::bad_request("Amount must be positive"));
    }
    let asset = parse_crypto_symbol(&request.crypto_symbol)?;
    let currency = parse_target_currency(&request.target_currency)?;

    let quotes = state
        .feed
        .crypto_data()
        .await
        .map_err(|e| ApiError::service_unavailable(e.to_string()))?;
    let inr_to_target = inr_to_target_rate(&state, currency).await?;

    let price_inr = quotes
        .get(&asset)
        .map(|q| q.price_inr)
        .ok_or_else(|| ApiError::service_unavailable("Price feed returned no quote"))?;

    let converted_value = quoted_value(request.amount, price_inr, inr_to_target);

    let mut prices_for_1_unit = BTreeMap::new();
    for crypto in Asset::CRYPTO {
        if let Some(quote) = quotes.get(&crypto) {
            prices_for_1_unit.insert(
                crypto.symbol().to_string(),
                round2(fiat_value(1.0, quote.price_inr, inr_to_target)),
            );
        }
    }

    Ok(Json(LiveRatesResponse {
        converted_value,
        prices_for_1_unit,
    }))
}

/// Convert a crypto holding into fiat.
///
/// The crypto leg settles on the ledger into the house account first; the
/// fiat credit and the conversion log record are then committed atomically.
/// The fiat ledger is denominated in INR, so a non-INR target credits the
/// INR equivalent of the net value.
#[utoipa::path(
    post,
    path = "/convert",
    tag = "Conversions",
    request_body = ConvertRequest,
    responses(
        (status = 200, description = "Conversion settled", body = ConvertResponse),
        (status = 400, description = "Invalid parameters or missing sub-account"),
        (status = 401, description = "Incorrect password"),
        (status = 404, description = "Wallet not found"),
        (status = 500, description = "Ledger transfer failed"),
        (status = 503, description = "Rate provider unavailable")
    )
)]
pub async fn convert_crypto(
    State(state): State<AppState>,
    Json(request): Json<ConvertRequest>,
) -> Result<Json<ConvertResponse>, ApiError> {
    if request.sender_email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Missing required parameters"));
    }
    if !(request.amount > 0.0) || !request.amount.is_finite() {
        return Err(ApiError::bad_request("Amount must be positive"));
    }
    let asset = parse_crypto_symbol(&request.crypto_symbol)?;
    let currency = parse_target_currency(&request.target_currency)?;

    let wallet = state
        .db
        .authenticate(&request.sender_email, &request.password)
        .map_err(|e| match e {
            StorageError::NotFound(_) => ApiError::not_found("Wallet not found"),
            StorageError::BadCredentials(_) => ApiError::unauthorized("Incorrect password"),
            other => ApiError::internal(format!("Failed to access wallet store: {other}")),
        })?;

    let secret = wallet
        .wallet_secrets
        .get(&asset)
        .and_then(Clone::clone)
        .ok_or_else(|| {
            ApiError::bad_request(format!(
                "{} wallet not configured for user",
                asset.symbol()
            ))
        })?;

    let quotes = state
        .feed
        .crypto_data()
        .await
        .map_err(|e| ApiError::service_unavailable(e.to_string()))?;
    let price_inr = quotes
        .get(&asset)
        .map(|q| q.price_inr)
        .ok_or_else(|| ApiError::service_unavailable("Price feed returned no quote"))?;
    let inr_to_target = inr_to_target_rate(&state, currency).await?;

    let gross = fiat_value(request.amount, price_inr, inr_to_target);
    let net = round2(net_after_fee(gross));
    let net_inr_credit = round2(net_after_fee(request.amount * price_inr));

    let transaction_hash = state
        .ledger
        .pay(
            &secret,
            &state.config.house_account_address,
            request.amount,
        )
        .await
        .map_err(|e| {
            error!(
                asset = asset.code(),
                email = %wallet.email,
                "conversion ledger leg failed: {e}"
            );
            ApiError::internal("Crypto transfer failed")
        })?;

    let record = StoredTransaction::conversion(
        &wallet.email,
        request.amount,
        asset,
        currency,
        round2(gross),
        net,
        FEE_PERCENTAGE,
        &transaction_hash,
    );
    let updated_balance = state
        .db
        .record_conversion(&wallet.email, net_inr_credit, &record)
        .map_err(|e| ApiError::internal(format!("Failed to record conversion: {e}")))?;

    info!(
        asset = asset.code(),
        amount = request.amount,
        net,
        balance = updated_balance,
        explorer = %state.ledger.explorer_tx_url(&transaction_hash),
        "conversion settled"
    );

    Ok(Json(ConvertResponse {
        message: "Conversion successful".to_string(),
        crypto_amount: request.amount,
        crypto_symbol: asset.symbol().to_string(),
        net_value_after_fee: net,
        target_currency: currency.code().to_string(),
        transaction_hash,
    }))
}

/// Quoted value at current rates; no fee is applied to quotes.
fn quoted_value(amount: f64, price_inr: f64, inr_to_target: Option<f64>) -> f64 {
    round2(fiat_value(amount, price_inr, inr_to_target))
}

fn parse_crypto_symbol(raw: &str) -> Result<Asset, ApiError> {
    Asset::parse(raw)
        .filter(|a| !a.is_fiat())
        .ok_or_else(|| ApiError::bad_request(format!("Unsupported crypto symbol: {raw}")))
}

fn parse_target_currency(raw: &str) -> Result<FiatCurrency, ApiError> {
    FiatCurrency::parse(raw)
        .ok_or_else(|| ApiError::bad_request(format!("Unsupported target currency: {raw}")))
}

/// INR→target rate, or `None` when the target is already INR.
async fn inr_to_target_rate(
    state: &AppState,
    currency: FiatCurrency,
) -> Result<Option<f64>, ApiError> {
    if currency == FiatCurrency::Inr {
        return Ok(None);
    }
    let rate = state
        .feed
        .exchange_rate(FiatCurrency::Inr, currency)
        .await
        .map_err(|e| ApiError::service_unavailable(e.to_string()))?;
    Ok(Some(rate))
}
