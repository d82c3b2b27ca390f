// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated transaction history.

use axum::{extract::State, Json};

use crate::{
    error::ApiError,
    models::{HistoryEntry, TransactionHistoryResponse, TransactionType, TransactionsRequest},
    state::AppState,
    storage::{StorageError, StoredTransaction},
};

/// List the caller's transaction history, newest first.
///
/// An unknown email and a wrong password produce the same response so the
/// endpoint cannot be used to probe which emails hold wallets.
#[utoipa::path(
    post,
    path = "/transactions",
    tag = "Transactions",
    request_body = TransactionsRequest,
    responses(
        (status = 200, description = "History entries", body = TransactionHistoryResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn get_transactions(
    State(state): State<AppState>,
    Json(request): Json<TransactionsRequest>,
) -> Result<Json<TransactionHistoryResponse>, ApiError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Missing required parameters"));
    }

    state
        .db
        .authenticate(&request.email, &request.password)
        .map_err(|e| match e {
            StorageError::NotFound(_) | StorageError::BadCredentials(_) => {
                ApiError::unauthorized("Invalid credentials")
            }
            other => ApiError::internal(format!("Failed to access wallet store: {other}")),
        })?;

    let records = state
        .db
        .list_transactions(&request.email)
        .map_err(|e| ApiError::internal(format!("Failed to read transaction log: {e}")))?;

    let transactions = records
        .iter()
        .enumerate()
        .map(|(index, record)| history_entry(index + 1, record))
        .collect();

    Ok(Json(TransactionHistoryResponse { transactions }))
}

/// Project a stored log record into its display form.
///
/// Sent legs are negative and name the destination; received legs are
/// positive and name the source; conversions carry the absolute net fiat
/// value and a `SYM to CUR` label.
fn history_entry(id: usize, record: &StoredTransaction) -> HistoryEntry {
    let (name, amount) = match record.transaction_type {
        TransactionType::Sent => (
            record.counterparty.clone().unwrap_or_default(),
            -record.amount.abs(),
        ),
        TransactionType::Received => (
            record.counterparty.clone().unwrap_or_default(),
            record.amount.abs(),
        ),
        TransactionType::Convert => {
            let currency = record
                .target_currency
                .map(|c| c.code())
                .unwrap_or("INR");
            (
                format!("{} to {}", record.asset.symbol(), currency),
                record.net_value_after_fee.unwrap_or(0.0).abs(),
            )
        }
    };

    HistoryEntry {
        id,
        entry_type: record.transaction_type.as_str().to_string(),
        name,
        date: record.timestamp.format("%Y-%m-%d").to_string(),
        amount,
        status: "completed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Asset, FiatCurrency};

    #[test]
    fn sent_leg_is_negative_and_names_destination() {
        let record = StoredTransaction::transfer_leg(
            "a@example.com",
            "b@example.com",
            0.5,
            Asset::Eth,
            TransactionType::Sent,
            "0xabc",
        );
        let entry = history_entry(1, &record);
        assert_eq!(entry.id, 1);
        assert_eq!(entry.entry_type, "sent");
        assert_eq!(entry.name, "b@example.com");
        assert_eq!(entry.amount, -0.5);
        assert_eq!(entry.status, "completed");
    }

    #[test]
    fn received_leg_is_positive_and_names_source() {
        let record = StoredTransaction::transfer_leg(
            "b@example.com",
            "a@example.com",
            0.5,
            Asset::Eth,
            TransactionType::Received,
            "0xabc",
        );
        let entry = history_entry(2, &record);
        assert_eq!(entry.entry_type, "received");
        assert_eq!(entry.name, "a@example.com");
        assert_eq!(entry.amount, 0.5);
    }

    #[test]
    fn conversion_shows_net_value_and_pair_label() {
        let record = StoredTransaction::conversion(
            "a@example.com",
            0.01,
            Asset::Btc,
            FiatCurrency::Inr,
            50000.0,
            48750.0,
            2.5,
            "0xdef",
        );
        let entry = history_entry(3, &record);
        assert_eq!(entry.entry_type, "convert");
        assert_eq!(entry.name, "BTC to INR");
        assert_eq!(entry.amount, 48750.0);
    }

    #[test]
    fn date_is_day_precision() {
        let record = StoredTransaction::transfer_leg(
            "a@example.com",
            "b@example.com",
            1.0,
            Asset::Sol,
            TransactionType::Sent,
            "0xabc",
        );
        let entry = history_entry(1, &record);
        assert_eq!(entry.date, record.timestamp.format("%Y-%m-%d").to_string());
        assert_eq!(entry.date.len(), 10);
    }
}
