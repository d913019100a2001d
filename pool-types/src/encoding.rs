//! Base64 helpers for binary wire fields.
//!
//! Standard alphabet with padding, matching what the server stores and
//! what exporters emit. Nonces, ciphertext and salts all go through here.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode bytes as standard base64 with padding.
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64 with padding.
pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(s)
}
