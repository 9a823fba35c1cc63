//! Signature verification for inbound webhook requests
//!
//! Senders sign every webhook body with HMAC-SHA256 keyed by the shared secret
//! and send the lowercase hex digest in the `X-Signature` header.
//!
//! # Important Notes
//!
//! - The signature MUST be computed on the raw request body bytes, not parsed JSON
//! - The comparison must be constant-time to prevent timing attacks
//! - A malformed header is a mismatch, never an error

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 over a body that may arrive in several chunks
pub struct BodySignature {
    mac: Option<HmacSha256>,
}

impl BodySignature {
    pub fn new(secret: &str) -> Self {
        let mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
            Ok(m) => Some(m),
            Err(e) => {
                logfire::error!(
                    "Failed to create HMAC instance: {error}",
                    error = e.to_string()
                );
                None
            }
        };
        Self { mac }
    }

    pub fn update(&mut self, chunk: &[u8]) {
        if let Some(mac) = self.mac.as_mut() {
            mac.update(chunk);
        }
    }

    /// Lowercase hex digest of every byte fed so far
    pub fn hex_digest(self) -> Option<String> {
        self.mac
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
    }

    /// Compares the digest with the `X-Signature` header value
    ///
    /// # Returns
    ///
    /// * `true` if the signature matches
    /// * `false` if it is missing, empty, malformed or different
    pub fn matches(self, signature: Option<&str>) -> bool {
        let provided = match signature.map(str::trim) {
            Some(sig) if !sig.is_empty() => sig,
            _ => return false,
        };

        let Some(computed) = self.hex_digest() else {
            return false;
        };

        // slices of different length compare unequal
        computed.as_bytes().ct_eq(provided.as_bytes()).into()
    }
}

/// Hex-encoded HMAC-SHA256 of `payload` keyed by `secret`
pub fn sign(secret: &str, payload: &[u8]) -> Option<String> {
    let mut body_signature = BodySignature::new(secret);
    body_signature.update(payload);
    body_signature.hex_digest()
}

/// Verifies the `X-Signature` header against the raw request body
///
/// # Arguments
///
/// * `secret` - The shared webhook secret
/// * `payload` - The raw request body bytes
/// * `signature` - The header value, if any
pub fn verify_signature(secret: &str, payload: &[u8], signature: Option<&str>) -> bool {
    let mut body_signature = BodySignature::new(secret);
    body_signature.update(payload);
    body_signature.matches(signature)
}
