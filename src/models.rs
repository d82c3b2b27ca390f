// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures used by the REST API, plus the small
//! domain vocabulary shared across modules. All types derive `Serialize`,
//! `Deserialize`, and `ToSchema` for automatic JSON handling and OpenAPI
//! documentation.
//!
//! ## Asset Vocabulary
//!
//! [`Asset`] is the closed set of wallet types this service supports: three
//! crypto assets settled on the ledger network plus the `inr` fiat
//! pseudo-asset tracked off-chain. [`FiatCurrency`] is the closed set of
//! quote currencies the conversion endpoints accept.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Asset Vocabulary
// =============================================================================

/// A wallet type supported by this service.
///
/// The lowercase serde form (`btc`, `eth`, `sol`, `inr`) matches the keys of
/// the `wallet_addresses` and `wallet_secrets` maps on wallet records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    Btc,
    Eth,
    Sol,
    Inr,
}

impl Asset {
    /// The crypto assets that get an on-ledger sub-account per wallet.
    pub const CRYPTO: [Asset; 3] = [Asset::Btc, Asset::Eth, Asset::Sol];

    /// Uppercase ticker symbol (`BTC`, `ETH`, `SOL`, `INR`).
    pub fn symbol(self) -> &'static str {
        match self {
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
            Asset::Sol => "SOL",
            Asset::Inr => "INR",
        }
    }

    /// Lowercase wallet-map key (`btc`, `eth`, `sol`, `inr`).
    pub fn code(self) -> &'static str {
        match self {
            Asset::Btc => "btc",
            Asset::Eth => "eth",
            Asset::Sol => "sol",
            Asset::Inr => "inr",
        }
    }

    /// Whether this is the off-chain fiat pseudo-asset.
    pub fn is_fiat(self) -> bool {
        matches!(self, Asset::Inr)
    }

    /// Parse a symbol or wallet-map key, case-insensitive.
    pub fn parse(raw: &str) -> Option<Asset> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "btc" => Some(Asset::Btc),
            "eth" => Some(Asset::Eth),
            "sol" => Some(Asset::Sol),
            "inr" => Some(Asset::Inr),
            _ => None,
        }
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A fiat quote currency accepted by the conversion endpoints.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum FiatCurrency {
    Inr,
    Usd,
}

impl FiatCurrency {
    /// Uppercase ISO-style code.
    pub fn code(self) -> &'static str {
        match self {
            FiatCurrency::Inr => "INR",
            FiatCurrency::Usd => "USD",
        }
    }

    /// Parse a currency code, case-insensitive.
    pub fn parse(raw: &str) -> Option<FiatCurrency> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "INR" => Some(FiatCurrency::Inr),
            "USD" => Some(FiatCurrency::Usd),
            _ => None,
        }
    }
}

impl std::fmt::Display for FiatCurrency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Direction of a transaction log leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Outgoing leg owned by the sender.
    Sent,
    /// Incoming leg owned by the receiver.
    Received,
    /// Crypto-to-fiat conversion settlement.
    Convert,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Sent => "sent",
            TransactionType::Received => "received",
            TransactionType::Convert => "convert",
        }
    }
}

// =============================================================================
// Wallet Models
// =============================================================================

/// Request to create a new wallet.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateWalletRequest {
    /// Display name of the user.
    pub name: String,
    /// Email address; unique key of the wallet record.
    pub email: String,
    /// Password for later authentication (stored as a salted hash).
    pub password: String,
}

/// Response after successful wallet creation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateWalletResponse {
    pub message: String,
    /// One on-ledger address per crypto asset plus the fiat pseudo-address.
    pub wallet_addresses: BTreeMap<Asset, String>,
}

/// Request to access (log into) an existing wallet.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AccessWalletRequest {
    pub email: String,
    pub password: String,
}

/// Full wallet view returned after authentication.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccessWalletResponse {
    pub name: String,
    pub email: String,
    pub wallet_addresses: BTreeMap<Asset, String>,
    /// Signing secrets per asset; `null` for the fiat pseudo-asset.
    pub wallet_secrets: BTreeMap<Asset, Option<String>>,
}

// =============================================================================
// Balance Models
// =============================================================================

/// Addresses to query in a balance request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BalanceAddresses {
    pub btc: String,
    pub eth: String,
    pub sol: String,
    /// Synthetic fiat identifier; accepted but not used for lookups.
    #[serde(default)]
    pub inr: Option<String>,
}

/// Request body for the balance endpoint.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BalanceRequest {
    pub wallet_addresses: BalanceAddresses,
}

/// Balance entry for a single asset.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssetBalance {
    /// Native balance (whole coins for crypto, rupees for fiat).
    pub balance: f64,
    /// Reference price of one unit in INR.
    pub price_inr: f64,
    /// 24-hour price change percentage, rounded to 2 decimals.
    pub change_24h: f64,
    /// Balance valued in INR, rounded to 2 decimals.
    pub inr_value: f64,
}

/// Response body for the balance endpoint, keyed by ticker symbol.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub balances: BTreeMap<String, AssetBalance>,
}

// =============================================================================
// Payment Models
// =============================================================================

/// Request body for a peer transfer.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SendPaymentRequest {
    pub sender_email: String,
    pub password: String,
    pub destination_email: String,
    pub amount: f64,
    /// Wallet-map key of the asset to move (`btc`, `eth`, `sol`, `inr`).
    pub wallet_type: String,
}

/// Response body for a successful transfer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SendPaymentResponse {
    pub message: String,
    /// Ledger hash for crypto; generated identifier for fiat.
    pub transaction_hash: String,
}

// =============================================================================
// Conversion Models
// =============================================================================

/// Request body for a crypto-to-fiat quote (no settlement).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LiveRatesRequest {
    pub amount: f64,
    pub crypto_symbol: String,
    pub target_currency: String,
}

/// Quote response: converted value plus unit prices for every crypto asset.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LiveRatesResponse {
    /// `amount` valued in the target currency, rounded to 2 decimals.
    pub converted_value: f64,
    /// Price of 1 unit of each crypto asset in the target currency.
    pub prices_for_1_unit: BTreeMap<String, f64>,
}

/// Request body for a crypto-to-fiat settlement.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ConvertRequest {
    pub sender_email: String,
    pub password: String,
    pub crypto_symbol: String,
    pub amount: f64,
    pub target_currency: String,
}

/// Response body after a settled conversion.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConvertResponse {
    pub message: String,
    pub crypto_amount: f64,
    pub crypto_symbol: String,
    /// Credited fiat value after the 2.5% fee, rounded to 2 decimals.
    pub net_value_after_fee: f64,
    pub target_currency: String,
    pub transaction_hash: String,
}

// =============================================================================
// QR Models
// =============================================================================

/// Request body for receiving-address QR generation.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GenerateQrRequest {
    /// On-ledger address to encode (`0x` + 40 hex characters).
    pub address: String,
}

// =============================================================================
// Transaction History Models
// =============================================================================

/// Request body for transaction history retrieval.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransactionsRequest {
    pub email: String,
    pub password: String,
}

/// One row of transaction history.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryEntry {
    /// 1-based position in the returned list.
    pub id: usize,
    /// `sent`, `received`, or `convert`.
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Counterparty email, or `"<SYM> to <CUR>"` for conversions.
    pub name: String,
    /// `YYYY-MM-DD` date of the transaction.
    pub date: String,
    /// Negative for sent legs, positive for received and convert legs.
    pub amount: f64,
    pub status: String,
}

/// Response body for transaction history retrieval.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionHistoryResponse {
    pub transactions: Vec<HistoryEntry>,
}
