//! Integrity providers: the signer/verifier attached to each Shamir share.
//!
//! A share's `provider_id` byte picks the provider on the combine side, so
//! the id values are wire format. The "none" provider intentionally emits
//! empty signatures that verify; existing share tokens depend on it.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use tvault_core::error::{codes, Category, VaultError, VaultResult};
use tvault_core::IntegrityType;

type HmacSha256 = Hmac<Sha256>;

/// Signer/verifier capability attached to shares.
///
/// Providers carry an immutable key and are safe for repeated sequential
/// use within one orchestrator call.
pub trait IntegrityProvider: std::fmt::Debug {
    fn sign(&self, id: u8, data: &[u8]) -> VaultResult<Vec<u8>>;
    fn verify(&self, id: u8, data: &[u8], signature: &[u8]) -> VaultResult<bool>;
    fn id(&self) -> u8;
}

/// No protection: empty signatures, verification always passes. The caller
/// accepts that forged shares corrupt the reconstructed key.
#[derive(Debug)]
pub struct NoneProvider;

impl IntegrityProvider for NoneProvider {
    fn sign(&self, _id: u8, _data: &[u8]) -> VaultResult<Vec<u8>> {
        Ok(Vec::new())
    }

    fn verify(&self, _id: u8, _data: &[u8], _signature: &[u8]) -> VaultResult<bool> {
        Ok(true)
    }

    fn id(&self) -> u8 {
        IntegrityType::None.as_byte()
    }
}

/// HMAC-SHA256 over `[id] || data` with the derived integrity key.
#[derive(Debug)]
pub struct HmacProvider {
    key: Zeroizing<Vec<u8>>,
}

impl HmacProvider {
    pub fn new(key: &[u8]) -> Self {
        Self {
            key: Zeroizing::new(key.to_vec()),
        }
    }

    fn mac(&self, id: u8, data: &[u8]) -> HmacSha256 {
        // HMAC-SHA256 accepts keys of any length
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(&[id]);
        mac.update(data);
        mac
    }
}

impl IntegrityProvider for HmacProvider {
    fn sign(&self, id: u8, data: &[u8]) -> VaultResult<Vec<u8>> {
        Ok(self.mac(id, data).finalize().into_bytes().to_vec())
    }

    fn verify(&self, id: u8, data: &[u8], signature: &[u8]) -> VaultResult<bool> {
        // verify_slice is constant-time
        Ok(self.mac(id, data).verify_slice(signature).is_ok())
    }

    fn id(&self) -> u8 {
        IntegrityType::Hmac.as_byte()
    }
}

/// Builds a provider for the given type. Ed25519 is a reserved identifier
/// and fails until it is implemented.
pub fn create_provider(
    ty: IntegrityType,
    key: &[u8],
) -> VaultResult<Box<dyn IntegrityProvider>> {
    match ty {
        IntegrityType::None => Ok(Box::new(NoneProvider)),
        IntegrityType::Hmac => Ok(Box::new(HmacProvider::new(key))),
        IntegrityType::Ed25519 => Err(VaultError::internal(
            Category::Integrity,
            codes::ED25519_UNIMPLEMENTED,
            "integrity provider ed25519 unimplemented",
        )),
    }
}

/// Builds a provider from a share's `provider_id` wire byte.
pub fn create_provider_by_id(provider_id: u8, key: &[u8]) -> VaultResult<Box<dyn IntegrityProvider>> {
    create_provider(IntegrityType::from_byte(provider_id)?, key)
}
