//! Cryptographic primitives for chatpool.
//!
//! This module provides:
//! - Argon2id key derivation from the shared organization password
//! - XChaCha20-Poly1305 encryption with 192-bit nonces
//! - [`DerivedKeys`] with independent encryption and authentication halves
//!
//! # Security Notes
//!
//! - XChaCha20 uses 192-bit nonces (24 bytes), safe for random generation
//! - Argon2id runs with a fixed 64 MiB memory cost: every member derives
//!   the same keys from the same password + salt, and offline guessing of
//!   a shared password has to pay the memory cost per guess
//! - The 64-byte KDF output is split: first half encrypts, second half
//!   authenticates to the server. The halves are never interchangeable,
//!   and the server only ever sees a digest of the second half.

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Nonce size for XChaCha20-Poly1305 (192 bits = 24 bytes).
pub const NONCE_SIZE: usize = 24;

/// Key size for each derived half (256 bits = 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Salt size for key derivation (128 bits = 16 bytes).
pub const SALT_SIZE: usize = 16;

/// Total Argon2id output: encryption key followed by auth key material.
const DERIVED_LEN: usize = KEY_SIZE * 2;

/// Crypto errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed: the Poly1305 tag did not verify. Tampered
    /// ciphertext, wrong key or wrong nonce - indistinguishable by design.
    #[error("decryption failed: authentication error")]
    Authentication,

    /// The tag verified but the plaintext is not UTF-8. A payload from an
    /// incompatible protocol version, not a crypto failure.
    #[error("decrypted payload is not valid UTF-8")]
    Utf8,

    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
}

/// Argon2id cost parameters.
///
/// The default is fixed, not device-adaptive: all members of an
/// organization must derive identical keys from the same password + salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
}

impl KdfParams {
    /// Small parameters for tests and benches. Never use for real data.
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: 8 * 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    /// Memory cost in KiB.
    pub fn memory_kib(&self) -> u32 {
        self.memory_kib
    }

    /// Iteration count.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    fn to_argon2_params(self) -> Result<Params, CryptoError> {
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(DERIVED_LEN),
        )
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))
    }
}

impl Default for KdfParams {
    /// 64 MiB, 3 iterations, single lane.
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 1,
        }
    }
}

/// Generate a random 16-byte KDF salt for a new organization.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    getrandom::getrandom(&mut salt).expect("getrandom failed");
    salt
}

/// The two independent key halves derived from an organization password.
///
/// The encryption key never leaves the process. The auth key material is
/// only ever hashed (see [`hash_auth_key`]) before anything derived from
/// it crosses the network.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeys {
    encryption_key: [u8; KEY_SIZE],
    auth_key_material: [u8; KEY_SIZE],
}

impl DerivedKeys {
    /// Build from raw halves (tests and key import).
    pub fn from_raw(encryption_key: [u8; KEY_SIZE], auth_key_material: [u8; KEY_SIZE]) -> Self {
        Self {
            encryption_key,
            auth_key_material,
        }
    }

    /// The half used for payload encryption.
    pub fn encryption_key(&self) -> &[u8; KEY_SIZE] {
        &self.encryption_key
    }

    /// The half used to prove password knowledge to the server.
    pub fn auth_key_material(&self) -> &[u8; KEY_SIZE] {
        &self.auth_key_material
    }
}

// Don't leak key material in debug output
impl std::fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DerivedKeys {{ encryption_key: [REDACTED], auth_key_material: [REDACTED] }}"
        )
    }
}

/// Derive both key halves from a password and the organization salt.
///
/// Callers validate the password length first; this function treats any
/// input as a candidate password.
pub fn derive_keys(password: &str, salt: &[u8; SALT_SIZE]) -> Result<DerivedKeys, CryptoError> {
    derive_keys_with_params(password, salt, KdfParams::default())
}

/// Derive with explicit Argon2 parameters (tests).
pub fn derive_keys_with_params(
    password: &str,
    salt: &[u8; SALT_SIZE],
    params: KdfParams,
) -> Result<DerivedKeys, CryptoError> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon2_params()?);

    let mut output = [0u8; DERIVED_LEN];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut output)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let mut encryption_key = [0u8; KEY_SIZE];
    let mut auth_key_material = [0u8; KEY_SIZE];
    encryption_key.copy_from_slice(&output[..KEY_SIZE]);
    auth_key_material.copy_from_slice(&output[KEY_SIZE..]);
    output.zeroize();

    Ok(DerivedKeys {
        encryption_key,
        auth_key_material,
    })
}

/// The bearer token presented to the server: lowercase hex SHA-256 of the
/// auth key material. One-way, so the material itself never leaves the
/// client.
pub fn hash_auth_key(auth_key_material: &[u8; KEY_SIZE]) -> String {
    hex::encode(Sha256::digest(auth_key_material))
}

/// What the server stores and compares: a digest of the bearer token,
/// shared with the server through the types crate so both ends always
/// agree on the scheme.
pub use pool_types::auth::stored_auth_hash;

/// An encrypted payload: the ciphertext plus the nonce it was sealed with.
/// The nonce is not secret and is stored next to the ciphertext.
#[derive(Clone)]
pub struct EncryptedPayload {
    /// Fresh random 24-byte nonce.
    pub nonce: [u8; NONCE_SIZE],
    /// XChaCha20-Poly1305 ciphertext, tag included.
    pub ciphertext: Vec<u8>,
}

impl std::fmt::Debug for EncryptedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedPayload")
            .field("nonce", &hex::encode(self.nonce))
            .field("ciphertext", &format!("[{} bytes]", self.ciphertext.len()))
            .finish()
    }
}

/// Encrypt a serialized conversation under the encryption key.
///
/// A fresh random 192-bit nonce is generated per call; with that size,
/// random generation needs no coordination between clients.
pub fn encrypt(plaintext: &str, key: &[u8; KEY_SIZE]) -> Result<EncryptedPayload, CryptoError> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    getrandom::getrandom(&mut nonce_bytes).expect("getrandom failed");
    let nonce = XNonce::from_slice(&nonce_bytes);

    let cipher = XChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|_| CryptoError::EncryptionFailed("aead encrypt failed".into()))?;

    Ok(EncryptedPayload {
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Decrypt a server-delivered payload back into the serialized
/// conversation.
///
/// The Poly1305 check is the only integrity protection on server data;
/// its failure must reach the caller as [`CryptoError::Authentication`].
pub fn decrypt(
    ciphertext: &[u8],
    nonce: &[u8; NONCE_SIZE],
    key: &[u8; KEY_SIZE],
) -> Result<String, CryptoError> {
    let nonce = XNonce::from_slice(nonce);

    let cipher = XChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::Authentication)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::Utf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; KEY_SIZE] {
        let mut key = [0u8; KEY_SIZE];
        getrandom::getrandom(&mut key).unwrap();
        key
    }

    // ===========================================
    // Key Derivation Tests
    // ===========================================

    #[test]
    fn derivation_is_deterministic() {
        let salt = [7u8; SALT_SIZE];
        let params = KdfParams::insecure_fast();
        let a = derive_keys_with_params("correct horse battery", &salt, params).unwrap();
        let b = derive_keys_with_params("correct horse battery", &salt, params).unwrap();
        assert_eq!(a.encryption_key(), b.encryption_key());
        assert_eq!(a.auth_key_material(), b.auth_key_material());
    }

    #[test]
    fn different_passwords_differ() {
        let salt = [7u8; SALT_SIZE];
        let params = KdfParams::insecure_fast();
        let a = derive_keys_with_params("password-one", &salt, params).unwrap();
        let b = derive_keys_with_params("password-two", &salt, params).unwrap();
        assert_ne!(a.encryption_key(), b.encryption_key());
    }

    #[test]
    fn different_salts_differ() {
        let params = KdfParams::insecure_fast();
        let a = derive_keys_with_params("same password", &[1u8; SALT_SIZE], params).unwrap();
        let b = derive_keys_with_params("same password", &[2u8; SALT_SIZE], params).unwrap();
        assert_ne!(a.encryption_key(), b.encryption_key());
    }

    #[test]
    fn halves_are_independent() {
        let params = KdfParams::insecure_fast();
        let keys = derive_keys_with_params("some password", &[9u8; SALT_SIZE], params).unwrap();
        assert_ne!(keys.encryption_key(), keys.auth_key_material());
    }

    #[test]
    fn default_params_are_fixed_cost() {
        let params = KdfParams::default();
        assert_eq!(params.memory_kib(), 64 * 1024);
        assert_eq!(params.iterations(), 3);
    }

    #[test]
    fn derived_keys_debug_is_redacted() {
        let keys = DerivedKeys::from_raw([1u8; KEY_SIZE], [2u8; KEY_SIZE]);
        let debug = format!("{:?}", keys);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("[1,"));
    }

    // ===========================================
    // Auth Digest Tests
    // ===========================================

    #[test]
    fn bearer_is_hex_sha256_of_material() {
        let keys = DerivedKeys::from_raw([0u8; KEY_SIZE], [0u8; KEY_SIZE]);
        let bearer = hash_auth_key(keys.auth_key_material());
        assert_eq!(bearer.len(), 64);
        assert!(bearer.chars().all(|c| c.is_ascii_hexdigit()));
        // SHA-256 of 32 zero bytes, a known vector.
        assert_eq!(
            bearer,
            "66687aadf862bd776c8fc18b8e9f8e20089714856ee233b3902a591d0d5f2925"
        );
    }

    #[test]
    fn stored_hash_is_digest_of_bearer_not_of_material() {
        let keys = DerivedKeys::from_raw([3u8; KEY_SIZE], [4u8; KEY_SIZE]);
        let bearer = hash_auth_key(keys.auth_key_material());
        let stored = stored_auth_hash(&bearer);
        assert_ne!(stored, bearer);
        // Recomputing from the presented bearer matches what was stored.
        assert_eq!(stored_auth_hash(&bearer), stored);
    }

    // ===========================================
    // XChaCha20-Poly1305 Tests (192-bit nonces)
    // ===========================================

    #[test]
    fn round_trip() {
        let key = test_key();
        let payload = encrypt("Hello, pooled world!", &key).unwrap();
        assert_eq!(payload.nonce.len(), 24, "must use 192-bit nonces");
        let plaintext = decrypt(&payload.ciphertext, &payload.nonce, &key).unwrap();
        assert_eq!(plaintext, "Hello, pooled world!");
    }

    #[test]
    fn fresh_nonce_per_call() {
        let key = test_key();
        let a = encrypt("same message", &key).unwrap();
        let b = encrypt("same message", &key).unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
        assert_eq!(decrypt(&a.ciphertext, &a.nonce, &key).unwrap(), "same message");
        assert_eq!(decrypt(&b.ciphertext, &b.nonce, &key).unwrap(), "same message");
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let key = test_key();
        let payload = encrypt("secret", &key).unwrap();
        for i in 0..payload.ciphertext.len() {
            let mut tampered = payload.ciphertext.clone();
            tampered[i] ^= 0x01;
            let result = decrypt(&tampered, &payload.nonce, &key);
            assert!(
                matches!(result, Err(CryptoError::Authentication)),
                "bit flip at byte {i} must fail authentication"
            );
        }
    }

    #[test]
    fn tampered_nonce_fails_authentication() {
        let key = test_key();
        let payload = encrypt("secret", &key).unwrap();
        let mut nonce = payload.nonce;
        nonce[0] ^= 0x01;
        assert!(matches!(
            decrypt(&payload.ciphertext, &nonce, &key),
            Err(CryptoError::Authentication)
        ));
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let payload = encrypt("secret", &test_key()).unwrap();
        assert!(matches!(
            decrypt(&payload.ciphertext, &payload.nonce, &test_key()),
            Err(CryptoError::Authentication)
        ));
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let key = test_key();
        let payload = encrypt("", &key).unwrap();
        assert_eq!(decrypt(&payload.ciphertext, &payload.nonce, &key).unwrap(), "");
    }

    #[test]
    fn large_plaintext_round_trips() {
        let key = test_key();
        let plaintext = "x".repeat(1024 * 1024);
        let payload = encrypt(&plaintext, &key).unwrap();
        assert_eq!(
            decrypt(&payload.ciphertext, &payload.nonce, &key).unwrap(),
            plaintext
        );
    }

    #[test]
    fn unicode_survives() {
        let key = test_key();
        let plaintext = "snö ❄ 日本語 {\"k\":\"v\"}";
        let payload = encrypt(plaintext, &key).unwrap();
        assert_eq!(
            decrypt(&payload.ciphertext, &payload.nonce, &key).unwrap(),
            plaintext
        );
    }

    // ===========================================
    // Salt Tests
    // ===========================================

    #[test]
    fn salts_are_random_and_sized() {
        let a = generate_salt();
        let b = generate_salt();
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
    }
}
