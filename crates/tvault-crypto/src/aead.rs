//! AES-256-GCM seal/open for the container payload.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};

use tvault_core::error::{codes, Category, VaultError, VaultResult};
use tvault_core::NONCE_LEN;

use crate::kdf::DataKey;

/// Encrypts `plaintext`, returning `ciphertext || tag`.
///
/// The nonce must be freshly sampled for every seal; the caller writes it
/// into the header before this call so the on-disk nonce is authoritative.
pub fn seal(key: &DataKey, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> VaultResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| {
            VaultError::crypto(
                Category::Container,
                codes::SEAL_FAILED,
                "failed to seal container payload",
            )
        })
}

/// Decrypts `ciphertext || tag`.
///
/// A mismatched tag — wrong key or tampered ciphertext — surfaces as the
/// dedicated authentication error, distinct from any format error.
pub fn open(key: &DataKey, nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> VaultResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| {
            VaultError::crypto(
                Category::Container,
                codes::AUTHENTICATION_FAILED,
                "container authentication failed",
            )
        })
}
