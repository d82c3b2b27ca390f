// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger network integration (EVM testnet over JSON-RPC).

mod client;

pub use client::{
    coins_from_wei, wei_from_coins, LedgerClient, LedgerError, LedgerNetwork,
};
