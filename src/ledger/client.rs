// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM testnet client for ledger interactions.
//!
//! Wraps keypair generation, faucet funding, native balance queries, and
//! signed native payments. Balance lookups never fail: unknown accounts and
//! RPC errors degrade to a zero balance. Payments block until the network
//! confirms the receipt or a fixed timeout elapses; there is no retry.

use std::str::FromStr;
use std::time::Duration;

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::U256,
    primitives::Address,
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
};
use serde_json::json;

/// Fixed confirmation timeout for submitted payments.
const PAYMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for faucet HTTP calls.
const FAUCET_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP provider type (with all fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Ledger network configuration.
#[derive(Debug, Clone)]
pub struct LedgerNetwork {
    /// Network name for display.
    pub name: String,
    /// Chain ID.
    pub chain_id: u64,
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Testnet faucet endpoint.
    pub faucet_url: String,
    /// Block explorer base URL.
    pub explorer_url: String,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid signing secret: {0}")]
    InvalidSecret(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Funding failed: {0}")]
    FundingFailed(String),

    #[error("Payment failed: {0}")]
    PaymentFailed(String),
}

/// Client for a single EVM testnet.
pub struct LedgerClient {
    network: LedgerNetwork,
    rpc_url: url::Url,
    provider: HttpProvider,
    http: reqwest::Client,
}

impl LedgerClient {
    /// Create a new client for the given network.
    pub fn new(network: LedgerNetwork) -> Result<Self, LedgerError> {
        let rpc_url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| LedgerError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(rpc_url.clone());

        let http = reqwest::Client::builder()
            .timeout(FAUCET_TIMEOUT)
            .build()
            .unwrap_or_default();

        Ok(Self {
            network,
            rpc_url,
            provider,
            http,
        })
    }

    /// Generate a fresh keypair. Does not touch the network.
    ///
    /// Returns `(public_address, secret_hex)`.
    pub fn create_account() -> (String, String) {
        let signer = PrivateKeySigner::random();
        let address = signer.address().to_string();
        let secret = alloy::hex::encode(signer.to_bytes());
        (address, secret)
    }

    /// Request test funds for `address` from the faucet.
    ///
    /// Whether a repeated funding call is a no-op is an upstream property
    /// this client does not assume.
    pub async fn fund(&self, address: &str) -> Result<(), LedgerError> {
        let response = self
            .http
            .post(&self.network.faucet_url)
            .json(&json!({ "address": address }))
            .send()
            .await
            .map_err(|e| LedgerError::FundingFailed(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(LedgerError::FundingFailed(format!(
                "faucet returned {status}: {body}"
            )))
        }
    }

    /// Get the native balance of `address` in whole coins.
    ///
    /// Never fails: unknown accounts, bad addresses, and RPC errors all
    /// degrade to 0.0.
    pub async fn get_balance(&self, address: &str) -> f64 {
        let addr = match Address::from_str(address) {
            Ok(addr) => addr,
            Err(e) => {
                tracing::warn!("balance lookup for invalid address {address}: {e}");
                return 0.0;
            }
        };

        match self.provider.get_balance(addr).await {
            Ok(wei) => coins_from_wei(wei),
            Err(e) => {
                tracing::warn!("balance lookup failed for {address}: {e}");
                0.0
            }
        }
    }

    /// Build, sign, and submit a native payment, then wait for confirmation.
    ///
    /// Returns the transaction hash once the receipt lands. A timeout, a
    /// rejection, or a reverted receipt surfaces as [`LedgerError::PaymentFailed`].
    pub async fn pay(
        &self,
        sender_secret: &str,
        receiver_address: &str,
        amount: f64,
    ) -> Result<String, LedgerError> {
        let key_bytes = alloy::hex::decode(sender_secret)
            .map_err(|e| LedgerError::InvalidSecret(e.to_string()))?;
        let signer = PrivateKeySigner::from_slice(&key_bytes)
            .map_err(|e| LedgerError::InvalidSecret(e.to_string()))?;

        let to_addr = Address::from_str(receiver_address)
            .map_err(|e| LedgerError::InvalidAddress(e.to_string()))?;
        let amount_wei = wei_from_coins(amount)?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(self.rpc_url.clone());

        let tx = TransactionRequest::default().to(to_addr).value(amount_wei);

        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(|e| LedgerError::PaymentFailed(e.to_string()))?;

        let receipt = pending
            .with_timeout(Some(PAYMENT_TIMEOUT))
            .get_receipt()
            .await
            .map_err(|e| LedgerError::PaymentFailed(e.to_string()))?;

        if !receipt.status() {
            return Err(LedgerError::PaymentFailed(
                "transaction reverted on-chain".to_string(),
            ));
        }

        Ok(format!("{:?}", receipt.transaction_hash))
    }

    /// Explorer link for a transaction hash.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{tx_hash}", self.network.explorer_url)
    }

    /// The network configuration.
    pub fn network(&self) -> &LedgerNetwork {
        &self.network
    }
}

/// Convert a whole-coin amount to wei.
///
/// Amounts are taken at up to 9 decimal places; anything finer is below the
/// precision this service deals in.
pub fn wei_from_coins(amount: f64) -> Result<U256, LedgerError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(LedgerError::InvalidAmount(format!(
            "{amount} is not a valid payment amount"
        )));
    }

    let fixed = format!("{amount:.9}");
    let (whole_str, frac_str) = fixed
        .split_once('.')
        .unwrap_or((fixed.as_str(), ""));

    let whole = whole_str
        .parse::<u128>()
        .map_err(|_| LedgerError::InvalidAmount(fixed.clone()))?;
    let frac = frac_str
        .parse::<u128>()
        .map_err(|_| LedgerError::InvalidAmount(fixed.clone()))?;

    // 9 fractional digits, so scale the fraction by 1e9 to reach 18 decimals.
    let total = whole
        .checked_mul(1_000_000_000_000_000_000)
        .and_then(|w| w.checked_add(frac * 1_000_000_000))
        .ok_or_else(|| LedgerError::InvalidAmount(format!("{amount} overflows")))?;

    Ok(U256::from(total))
}

/// Convert a wei balance to whole coins.
pub fn coins_from_wei(wei: U256) -> f64 {
    let wei = u128::try_from(wei).unwrap_or(u128::MAX);
    wei as f64 / 1e18
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_account_yields_distinct_keypairs() {
        let (addr_a, secret_a) = LedgerClient::create_account();
        let (addr_b, secret_b) = LedgerClient::create_account();

        assert_ne!(addr_a, addr_b);
        assert_ne!(secret_a, secret_b);
        assert!(addr_a.starts_with("0x"));
        assert_eq!(addr_a.len(), 42);
        // 32-byte secret, hex encoded, no prefix.
        assert_eq!(secret_a.len(), 64);
    }

    #[test]
    fn wei_from_coins_whole_and_fractional() {
        assert_eq!(
            wei_from_coins(1.0).unwrap(),
            U256::from(1_000_000_000_000_000_000u128)
        );
        assert_eq!(
            wei_from_coins(0.5).unwrap(),
            U256::from(500_000_000_000_000_000u128)
        );
        assert_eq!(
            wei_from_coins(0.000000001).unwrap(),
            U256::from(1_000_000_000u128)
        );
    }

    #[test]
    fn wei_from_coins_rejects_bad_amounts() {
        assert!(wei_from_coins(-1.0).is_err());
        assert!(wei_from_coins(f64::NAN).is_err());
        assert!(wei_from_coins(f64::INFINITY).is_err());
    }

    #[test]
    fn coins_from_wei_round_trips() {
        let wei = wei_from_coins(1.5).unwrap();
        assert!((coins_from_wei(wei) - 1.5).abs() < 1e-9);

        assert_eq!(coins_from_wei(U256::ZERO), 0.0);
    }

    #[test]
    fn pay_rejects_malformed_secret() {
        let network = LedgerNetwork {
            name: "Testnet".to_string(),
            chain_id: 43113,
            rpc_url: "https://api.avax-test.network/ext/bc/C/rpc".to_string(),
            faucet_url: "https://faucet.example/fund".to_string(),
            explorer_url: "https://testnet.snowtrace.io".to_string(),
        };
        let client = LedgerClient::new(network).unwrap();

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let err = rt
            .block_on(client.pay("not-hex", "0x0000000000000000000000000000000000000001", 1.0))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidSecret(_)));
    }
}
