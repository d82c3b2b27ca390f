// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! QR payment-code rendering.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use image::Rgb;
use qrcode::{EcLevel, QrCode};

use crate::{error::ApiError, models::GenerateQrRequest, state::AppState};

/// Pixels per QR module in the rendered image.
const MODULE_PIXELS: u32 = 10;

/// Foreground color of the rendered code.
const DARK: Rgb<u8> = Rgb([0x0b, 0x0d, 0x2b]);

/// Render a PNG payment code for a ledger address.
///
/// The payload is a `ethereum:{address}@{chain_id}` payment URI so that
/// scanning wallets resolve both the address and the network.
#[utoipa::path(
    post,
    path = "/generate-qr",
    tag = "Payments",
    request_body = GenerateQrRequest,
    responses(
        (status = 200, description = "PNG image", content_type = "image/png"),
        (status = 400, description = "Invalid wallet address"),
        (status = 500, description = "Encoding failed")
    )
)]
pub async fn generate_qr(
    State(state): State<AppState>,
    Json(request): Json<GenerateQrRequest>,
) -> Result<Response, ApiError> {
    let address = request.address.trim();
    if !is_valid_address(address) {
        return Err(ApiError::bad_request("Invalid wallet address"));
    }

    let payload = format!("ethereum:{address}@{}", state.config.chain_id);
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)
        .map_err(|e| ApiError::internal(format!("Failed to encode payment code: {e}")))?;

    let rendered = code
        .render::<Rgb<u8>>()
        .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
        .dark_color(DARK)
        .light_color(Rgb([0xff, 0xff, 0xff]))
        .build();

    let mut png = Vec::new();
    rendered
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| ApiError::internal(format!("Failed to render payment code: {e}")))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// A ledger address is `0x` followed by exactly 40 hex digits.
fn is_valid_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_address() {
        assert!(is_valid_address(
            "0x00000000000000000000000000000000000000aB"
        ));
    }

    #[test]
    fn rejects_bad_prefix_length_and_characters() {
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("0x1234"));
        assert!(!is_valid_address(
            "1x00000000000000000000000000000000000000ab"
        ));
        assert!(!is_valid_address(
            "0x0000000000000000000000000000000000000zzz"
        ));
    }
}
