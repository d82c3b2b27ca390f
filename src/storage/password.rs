// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Salted password hashing.
//!
//! Stored form: `base64(salt)$base64(hmac_sha256(key = salt, password))`.
//! Verification recomputes the MAC and compares in constant time via
//! [`hmac::Mac::verify_slice`]. Passwords are never persisted in clear text.

use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Hash a password with a fresh random 16-byte salt.
pub fn hash_password(password: &str) -> String {
    let salt = *Uuid::new_v4().as_bytes();
    encode(&salt, &mac_bytes(&salt, password))
}

/// Check a password against a stored `salt$mac` hash.
///
/// Returns `false` for malformed stored values rather than erroring; a
/// corrupt hash is indistinguishable from a wrong password to the caller.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_b64, mac_b64)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = Base64::decode_vec(salt_b64) else {
        return false;
    };
    let Ok(expected) = Base64::decode_vec(mac_b64) else {
        return false;
    };

    let mut mac = HmacSha256::new_from_slice(&salt).expect("HMAC accepts keys of any length");
    mac.update(password.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

fn mac_bytes(salt: &[u8], password: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(salt).expect("HMAC accepts keys of any length");
    mac.update(password.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

fn encode(salt: &[u8], mac: &[u8]) -> String {
    format!(
        "{}${}",
        Base64::encode_string(salt),
        Base64::encode_string(mac)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_verifies() {
        let hash = hash_password("hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn same_password_hashes_differently() {
        // Fresh salt per hash.
        let first = hash_password("secret");
        let second = hash_password("secret");
        assert_ne!(first, second);
        assert!(verify_password("secret", &first));
        assert!(verify_password("secret", &second));
    }

    #[test]
    fn malformed_stored_values_fail_closed() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "no-separator"));
        assert!(!verify_password("x", "!!!$!!!"));
    }
}
