//! Webhook signature handling
//!
//! Deliveries carry `X-Pikarama-Signature`: the hex HMAC-SHA256 of the JSON
//! body under the registration secret.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

use crate::error::Result;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Pikarama-Signature";

/// Hex HMAC-SHA256 of `payload` under `secret`.
pub fn compute_signature(secret: &str, payload: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Compact JSON text of a received body, keys in received order.
pub fn canonical_body(body: &Value) -> Result<String> {
    Ok(serde_json::to_string(body)?)
}

/// Check `signature` against the body as re-serialised.
pub fn verify_signature(secret: &str, body: &Value, signature: &str) -> Result<bool> {
    let expected = compute_signature(secret, canonical_body(body)?.as_bytes())?;
    Ok(constant_time_eq(signature.as_bytes(), expected.as_bytes()))
}

/// Constant-time byte comparison.
///
/// Lengths are compared up front (the length of a hex digest is public); the
/// byte loop never exits early.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }

    diff == 0
}
