// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::config::Config;
use crate::ledger::LedgerClient;
use crate::rates::PriceFeed;
use crate::storage::WalletDatabase;

/// Shared application state: explicitly constructed client handles injected
/// into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<WalletDatabase>,
    pub ledger: Arc<LedgerClient>,
    pub feed: Arc<PriceFeed>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        db: WalletDatabase,
        ledger: LedgerClient,
        feed: PriceFeed,
        config: Config,
    ) -> Self {
        Self {
            db: Arc::new(db),
            ledger: Arc::new(ledger),
            feed: Arc::new(feed),
            config: Arc::new(config),
        }
    }
}
