// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Conversion arithmetic.
//!
//! All intermediate math is full-precision `f64`; rounding to 2 decimals
//! happens only at response and log boundaries via [`round2`].

/// Fee applied on crypto-to-fiat settlements, in percent.
pub const FEE_PERCENTAGE: f64 = 2.5;

/// Round a monetary value to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Net settlement value after the fixed fee: `gross × 0.975`.
pub fn net_after_fee(gross: f64) -> f64 {
    gross * (1.0 - FEE_PERCENTAGE / 100.0)
}

/// Value of `amount` crypto in fiat, given the INR reference price and an
/// optional INR→target exchange rate.
pub fn fiat_value(amount: f64, price_inr: f64, inr_to_target: Option<f64>) -> f64 {
    let value_inr = amount * price_inr;
    match inr_to_target {
        Some(rate) => value_inr * rate,
        None => value_inr,
    }
}
