// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

mod api;
mod config;
mod error;
mod ledger;
mod models;
mod rates;
mod state;
mod storage;

#[cfg(not(test))]
use std::net::SocketAddr;

#[cfg(not(test))]
use tracing::info;
#[cfg(not(test))]
use tracing_subscriber::EnvFilter;

#[cfg(not(test))]
use api::router;
#[cfg(not(test))]
use config::Config;
#[cfg(not(test))]
use ledger::{LedgerClient, LedgerNetwork};
#[cfg(not(test))]
use rates::PriceFeed;
#[cfg(not(test))]
use state::AppState;
#[cfg(not(test))]
use storage::WalletDatabase;

#[cfg(not(test))]
#[tokio::main]
async fn main() {
    init_tracing();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("configuration error: {e}");
        std::process::exit(1);
    });

    std::fs::create_dir_all(&config.data_dir).unwrap_or_else(|e| {
        eprintln!("failed to create data directory {}: {e}", config.data_dir.display());
        std::process::exit(1);
    });

    let db = WalletDatabase::open(&config.database_path()).unwrap_or_else(|e| {
        eprintln!("failed to open wallet database: {e}");
        std::process::exit(1);
    });

    let ledger = LedgerClient::new(LedgerNetwork {
        name: "Avalanche Fuji".to_string(),
        chain_id: config.chain_id,
        rpc_url: config.rpc_url.clone(),
        faucet_url: config.faucet_url.clone(),
        explorer_url: config.explorer_url.clone(),
    })
    .unwrap_or_else(|e| {
        eprintln!("failed to construct ledger client: {e}");
        std::process::exit(1);
    });

    info!(
        "using ledger network {} (chain {})",
        ledger.network().name,
        ledger.network().chain_id
    );

    let feed = PriceFeed::new(
        config.price_feed_base_url.clone(),
        config.exchange_api_base_url.clone(),
        config.exchange_api_key.clone(),
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .unwrap_or_else(|e| {
            eprintln!("failed to parse bind address: {e}");
            std::process::exit(1);
        });

    let state = AppState::new(db, ledger, feed, config);
    let app = router(state);

    info!("Paisa wallet server listening on http://{addr} (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("failed to bind {addr}: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("server failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(not(test))]
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    if format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[cfg(not(test))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("failed to listen for shutdown signal: {e}");
    }
}
