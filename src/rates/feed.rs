// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-through price feed clients.
//!
//! Crypto spot prices and 24h change come from a CoinGecko-compatible
//! `simple/price` endpoint; fiat exchange rates come from an
//! exchangerate-api v6-compatible endpoint. Every call re-fetches: there is
//! no cache, no retry, and no backoff. Upstream failures and malformed
//! payloads surface as [`FeedError::Unavailable`].

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::models::{Asset, FiatCurrency};

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Spot quote for one crypto asset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AssetQuote {
    /// Price of one unit in INR.
    pub price_inr: f64,
    /// 24-hour change percentage.
    pub change_24h: f64,
}

/// Errors raised by the price feed adapter.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("price feed unavailable: {0}")]
    Unavailable(String),

    #[error("exchange rate for {0} missing from provider response")]
    UnsupportedCurrency(&'static str),
}

/// CoinGecko simple-price entry, quoted in INR.
#[derive(Debug, Deserialize)]
struct CoinQuote {
    inr: f64,
    #[serde(rename = "inr_24h_change", default)]
    change_24h: f64,
}

/// exchangerate-api v6 response envelope.
#[derive(Debug, Deserialize)]
struct ExchangeRateResponse {
    result: String,
    #[serde(default)]
    conversion_rates: HashMap<String, f64>,
}

/// HTTP client for crypto prices and fiat exchange rates.
#[derive(Debug, Clone)]
pub struct PriceFeed {
    http: Client,
    price_feed_base_url: String,
    exchange_api_base_url: String,
    exchange_api_key: String,
}

impl PriceFeed {
    pub fn new(
        price_feed_base_url: impl Into<String>,
        exchange_api_base_url: impl Into<String>,
        exchange_api_key: impl Into<String>,
    ) -> Self {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            price_feed_base_url: price_feed_base_url.into(),
            exchange_api_base_url: exchange_api_base_url.into(),
            exchange_api_key: exchange_api_key.into(),
        }
    }

    /// Fetch the current INR price and 24h change for every supported asset.
    pub async fn crypto_data(&self) -> Result<BTreeMap<Asset, AssetQuote>, FeedError> {
        let url = format!("{}/simple/price", self.price_feed_base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("ids", "bitcoin,ethereum,solana"),
                ("vs_currencies", "inr"),
                ("include_24hr_change", "true"),
            ])
            .send()
            .await
            .map_err(|e| FeedError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::Unavailable(format!(
                "price feed returned {}",
                response.status()
            )));
        }

        let payload: HashMap<String, CoinQuote> = response
            .json()
            .await
            .map_err(|e| FeedError::Unavailable(format!("malformed price payload: {e}")))?;

        let mut quotes = BTreeMap::new();
        for (asset, id) in [
            (Asset::Btc, "bitcoin"),
            (Asset::Eth, "ethereum"),
            (Asset::Sol, "solana"),
        ] {
            let quote = payload.get(id).ok_or_else(|| {
                FeedError::Unavailable(format!("price payload missing {id}"))
            })?;
            quotes.insert(
                asset,
                AssetQuote {
                    price_inr: quote.inr,
                    change_24h: quote.change_24h,
                },
            );
        }
        Ok(quotes)
    }

    /// Fetch the `base` → `target` fiat exchange rate.
    pub async fn exchange_rate(
        &self,
        base: FiatCurrency,
        target: FiatCurrency,
    ) -> Result<f64, FeedError> {
        let url = format!(
            "{}/{}/latest/{}",
            self.exchange_api_base_url,
            self.exchange_api_key,
            base.code()
        );
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FeedError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::Unavailable(format!(
                "exchange-rate provider returned {}",
                response.status()
            )));
        }

        let payload: ExchangeRateResponse = response
            .json()
            .await
            .map_err(|e| FeedError::Unavailable(format!("malformed rate payload: {e}")))?;

        if payload.result != "success" {
            return Err(FeedError::Unavailable(format!(
                "exchange-rate provider result: {}",
                payload.result
            )));
        }

        payload
            .conversion_rates
            .get(target.code())
            .copied()
            .ok_or(FeedError::UnsupportedCurrency(target.code()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_quote_deserializes_coingecko_shape() {
        let json = r#"{"inr": 5000000.0, "inr_24h_change": -1.25}"#;
        let quote: CoinQuote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.inr, 5_000_000.0);
        assert_eq!(quote.change_24h, -1.25);
    }

    #[test]
    fn coin_quote_tolerates_missing_change_field() {
        let json = r#"{"inr": 100.0}"#;
        let quote: CoinQuote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.change_24h, 0.0);
    }

    #[test]
    fn exchange_response_deserializes_v6_shape() {
        let json = r#"{"result":"success","conversion_rates":{"USD":0.012,"INR":1.0}}"#;
        let payload: ExchangeRateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(payload.result, "success");
        assert_eq!(payload.conversion_rates["USD"], 0.012);
    }
}
