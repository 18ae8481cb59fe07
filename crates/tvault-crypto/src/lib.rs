//! tvault-crypto: the cryptographic pipeline behind Trust Vault containers
//!
//! Key hierarchy:
//! ```text
//! passphrase ── PBKDF2-HMAC-SHA256(salt, 100k) ──> k_data (AES-256-GCM, archive)
//! integrity passphrase ── PBKDF2(container salt) ──> k_tok (AES-256-CTR, tokens)
//! k_data ── Shamir (t, n) over GF(2^8) ──> signed share tokens
//! ```

pub mod aead;
pub mod gf256;
pub mod integrity;
pub mod kdf;
pub mod shamir;
pub mod token;

pub use integrity::{HmacProvider, IntegrityProvider, NoneProvider};
pub use kdf::{derive_key, DataKey};
pub use shamir::Share;
pub use token::{Token, TokenList};

use rand::rngs::OsRng;
use rand::RngCore;
use tvault_core::error::{codes, Category, VaultError, VaultResult};

/// Fills a fixed-size array from the platform CSPRNG.
///
/// An entropy failure is a Crypto error, not an I/O error: the pipeline
/// must never continue with a partially filled salt, nonce, or coefficient.
pub fn random_array<const N: usize>(category: Category) -> VaultResult<[u8; N]> {
    let mut buf = [0u8; N];
    random_fill(&mut buf, category)?;
    Ok(buf)
}

/// Fills a slice from the platform CSPRNG; see [`random_array`].
pub fn random_fill(buf: &mut [u8], category: Category) -> VaultResult<()> {
    OsRng.try_fill_bytes(buf).map_err(|e| {
        VaultError::crypto(category, codes::RANDOM_SOURCE, "random source failure").wrap(e)
    })
}
