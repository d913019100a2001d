//! The canonical authentication digest.
//!
//! A client proves password knowledge with a bearer token: the hex
//! SHA-256 of its derived auth key material. The server never stores that
//! token. It stores [`stored_auth_hash`] of it - a digest of the digest -
//! and recomputes the same value from the presented bearer on every
//! request. Client (at signup) and server (at auth) must call this exact
//! function, or authentication breaks; that is why it lives in the shared
//! types crate.

use sha2::{Digest, Sha256};

/// Hash a bearer token into the value the server stores and compares.
///
/// Lowercase hex SHA-256 over the UTF-8 bytes of the bearer string.
pub fn stored_auth_hash(bearer: &str) -> String {
    hex::encode(Sha256::digest(bearer.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_hex_sha256() {
        // SHA-256("abc"), the FIPS 180 test vector.
        assert_eq!(
            stored_auth_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_never_equals_input() {
        let bearer = "66687aadf862bd776c8fc18b8e9f8e20089714856ee233b3902a591d0d5f2925";
        assert_ne!(stored_auth_hash(bearer), bearer);
    }

    #[test]
    fn deterministic() {
        assert_eq!(stored_auth_hash("token"), stored_auth_hash("token"));
    }
}
