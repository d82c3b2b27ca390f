// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup and injected
//! into the components that need it.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory for the embedded wallet database | `/data` |
//! | `LEDGER_RPC_URL` | EVM testnet JSON-RPC endpoint | Avalanche Fuji |
//! | `LEDGER_CHAIN_ID` | Chain ID of the ledger network | `43113` |
//! | `LEDGER_FAUCET_URL` | Testnet faucet endpoint | Required |
//! | `LEDGER_EXPLORER_URL` | Block explorer base URL | Fuji Snowtrace |
//! | `HOUSE_ACCOUNT_ADDRESS` | House account that receives skims and conversions | Required |
//! | `EXCHANGE_API_KEY` | exchangerate-api.com v6 API key | Required |
//! | `EXCHANGE_API_BASE_URL` | Exchange-rate provider base URL | exchangerate-api v6 |
//! | `PRICE_FEED_BASE_URL` | Crypto price feed base URL | CoinGecko v3 |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{env, path::PathBuf};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "/data";
const DEFAULT_RPC_URL: &str = "https://api.avax-test.network/ext/bc/C/rpc";
const DEFAULT_CHAIN_ID: u64 = 43113;
const DEFAULT_EXPLORER_URL: &str = "https://testnet.snowtrace.io";
const DEFAULT_PRICE_FEED_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const DEFAULT_EXCHANGE_API_BASE_URL: &str = "https://v6.exchangerate-api.com/v6";

/// Errors raised while loading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("environment variable {0} has an invalid value: {1}")]
    InvalidVar(&'static str, String),
}

/// Process-wide configuration, loaded once in `main`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub host: String,
    /// Server bind port.
    pub port: u16,
    /// Directory holding the embedded wallet database file.
    pub data_dir: PathBuf,
    /// JSON-RPC endpoint of the ledger network.
    pub rpc_url: String,
    /// Chain ID of the ledger network.
    pub chain_id: u64,
    /// Testnet faucet endpoint used to fund new accounts.
    pub faucet_url: String,
    /// Block explorer base URL for transaction links.
    pub explorer_url: String,
    /// House account address receiving funding skims and conversion transfers.
    pub house_account_address: String,
    /// API key for the fiat exchange-rate provider.
    pub exchange_api_key: String,
    /// Base URL of the fiat exchange-rate provider.
    pub exchange_api_base_url: String,
    /// Base URL of the crypto price feed.
    pub price_feed_base_url: String,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidVar("PORT", raw))?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            host: env_or_default("HOST", DEFAULT_HOST),
            port,
            data_dir: PathBuf::from(env_or_default("DATA_DIR", DEFAULT_DATA_DIR)),
            rpc_url: env_or_default("LEDGER_RPC_URL", DEFAULT_RPC_URL),
            chain_id: match env::var("LEDGER_CHAIN_ID") {
                Ok(raw) => raw
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidVar("LEDGER_CHAIN_ID", raw))?,
                Err(_) => DEFAULT_CHAIN_ID,
            },
            faucet_url: env_required("LEDGER_FAUCET_URL")?,
            explorer_url: env_or_default("LEDGER_EXPLORER_URL", DEFAULT_EXPLORER_URL),
            house_account_address: env_required("HOUSE_ACCOUNT_ADDRESS")?,
            exchange_api_key: env_required("EXCHANGE_API_KEY")?,
            exchange_api_base_url: env_or_default(
                "EXCHANGE_API_BASE_URL",
                DEFAULT_EXCHANGE_API_BASE_URL,
            ),
            price_feed_base_url: env_or_default("PRICE_FEED_BASE_URL", DEFAULT_PRICE_FEED_BASE_URL),
        })
    }

    /// Path of the embedded database file inside `data_dir`.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("wallets.redb")
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_path_joins_data_dir() {
        let config = Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: PathBuf::from("/tmp/paisa"),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            faucet_url: "https://faucet.example/fund".to_string(),
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
            house_account_address: "0x0000000000000000000000000000000000000001".to_string(),
            exchange_api_key: "key".to_string(),
            exchange_api_base_url: DEFAULT_EXCHANGE_API_BASE_URL.to_string(),
            price_feed_base_url: DEFAULT_PRICE_FEED_BASE_URL.to_string(),
        };
        assert_eq!(config.database_path(), PathBuf::from("/tmp/paisa/wallets.redb"));
    }
}
