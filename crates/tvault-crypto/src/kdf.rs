//! Key derivation: PBKDF2-HMAC-SHA256 passphrase → 256-bit key (RFC 8018).

use pbkdf2::pbkdf2_hmac;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use zeroize::Zeroize;

use tvault_core::KEY_LEN;

/// A 256-bit key derived from a passphrase or restored from tokens.
///
/// Zeroized on drop so key material does not linger in freed memory.
#[derive(Clone)]
pub struct DataKey {
    bytes: [u8; KEY_LEN],
}

impl DataKey {
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl Drop for DataKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataKey").field("bytes", &"[REDACTED]").finish()
    }
}

impl PartialEq for DataKey {
    /// Constant-time; key equality must not leak a matching prefix length.
    fn eq(&self, other: &Self) -> bool {
        let mut diff = 0u8;
        for (x, y) in self.bytes.iter().zip(other.bytes.iter()) {
            diff |= x ^ y;
        }
        diff == 0
    }
}

impl Eq for DataKey {}

/// Derives a 256-bit key from a passphrase and salt via PBKDF2-HMAC-SHA256.
///
/// The salt is the 16-byte random value stored in the container header; it
/// is public. The iteration count is also recorded in the header so a
/// future bump does not break existing containers.
pub fn derive_key(passphrase: &SecretString, salt: &[u8], iterations: u32) -> DataKey {
    let mut out = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(passphrase.expose_secret().as_bytes(), salt, iterations, &mut out);
    DataKey::from_bytes(out)
}
