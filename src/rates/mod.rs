// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Market data and conversion arithmetic.
//!
//! - `feed` - read-through HTTP clients for crypto prices and fiat rates
//! - `convert` - pure fee and rounding arithmetic

pub mod convert;
pub mod feed;

pub use convert::{fiat_value, net_after_fee, round2, FEE_PERCENTAGE};
pub use feed::{AssetQuote, FeedError, PriceFeed};
