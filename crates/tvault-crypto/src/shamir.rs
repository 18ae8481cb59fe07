//! Shamir secret sharing over GF(2⁸) with per-share signatures.
//!
//! Split: every secret byte gets its own random polynomial of degree t−1
//! with the byte as the constant term; share j holds the evaluations at
//! x = j. Combine: Lagrange interpolation at x = 0 after every share
//! signature has verified.

use zeroize::Zeroize;

use tvault_core::error::{codes, Category, VaultError, VaultResult};

use crate::gf256;
use crate::integrity::IntegrityProvider;
use crate::random_fill;

/// One share of a split secret.
///
/// All shares from one split carry the same value length and provider id.
/// The value is a full-length vector: byte k is the k-th polynomial
/// evaluated at this share's id.
#[derive(Debug, Clone)]
pub struct Share {
    pub id: u8,
    pub value: Vec<u8>,
    pub provider_id: u8,
    pub signature: Vec<u8>,
}

impl Drop for Share {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

/// Splits `secret` into `n` shares with reconstruction threshold `t`.
pub fn split(
    secret: &[u8],
    n: usize,
    t: usize,
    provider: &dyn IntegrityProvider,
) -> VaultResult<Vec<Share>> {
    if t < 2 || t > 255 || n < t || n > 255 {
        return Err(VaultError::validation(
            Category::Shamir,
            codes::SHAMIR_INVALID_PARAMS,
            "invalid threshold or number of shares",
            "choose 2 <= threshold <= shares <= 255",
        ));
    }

    let mut values = vec![vec![0u8; secret.len()]; n];

    let mut coeffs = vec![0u8; t];
    for (k, &byte) in secret.iter().enumerate() {
        coeffs[0] = byte;
        random_fill(&mut coeffs[1..], Category::Shamir)?;

        for (j, value) in values.iter_mut().enumerate() {
            value[k] = gf256::eval(&coeffs, (j + 1) as u8);
        }
    }
    coeffs.zeroize();

    let mut shares = Vec::with_capacity(n);
    for (j, value) in values.into_iter().enumerate() {
        let id = (j + 1) as u8;
        let signature = provider.sign(id, &value)?;
        shares.push(Share {
            id,
            value,
            provider_id: provider.id(),
            signature,
        });
    }

    Ok(shares)
}

/// Reconstructs the secret from at least `t` shares.
///
/// Every signature must verify before any interpolation happens; a single
/// tampered share aborts the whole reconstruction.
pub fn combine(shares: &[Share], provider: &dyn IntegrityProvider) -> VaultResult<Vec<u8>> {
    if shares.len() < 2 {
        return Err(VaultError::crypto(
            Category::Shamir,
            codes::SHAMIR_NEED_SHARES,
            "need at least 2 shares",
        ));
    }

    let length = shares[0].value.len();
    let mut seen = [false; 256];
    for share in shares {
        if share.value.len() != length {
            return Err(VaultError::format(
                Category::Shamir,
                codes::SHAMIR_LENGTH_MISMATCH,
                "shares have mismatched value lengths",
            ));
        }
        // duplicate x-coordinates would divide by zero in the Lagrange sum
        if seen[share.id as usize] {
            return Err(VaultError::format(
                Category::Shamir,
                codes::SHAMIR_DUPLICATE_ID,
                format!("duplicate share id: {}", share.id),
            ));
        }
        seen[share.id as usize] = true;

        if !provider.verify(share.id, &share.value, &share.signature)? {
            return Err(VaultError::crypto(
                Category::Shamir,
                codes::SHAMIR_SIGNATURE_VERIFY,
                "verify share signature failed",
            )
            .with_details(format!("share id {}", share.id)));
        }
    }

    let mut secret = vec![0u8; length];
    for (k, out) in secret.iter_mut().enumerate() {
        *out = lagrange_at_zero(shares, k);
    }

    Ok(secret)
}

/// Lagrange interpolation of the k-th byte column at x = 0.
fn lagrange_at_zero(shares: &[Share], k: usize) -> u8 {
    let mut acc = 0u8;
    for (i, si) in shares.iter().enumerate() {
        let mut num = 1u8;
        let mut den = 1u8;
        for (j, sj) in shares.iter().enumerate() {
            if i == j {
                continue;
            }
            num = gf256::mul(num, sj.id);
            den = gf256::mul(den, gf256::add(si.id, sj.id));
        }
        acc = gf256::add(acc, gf256::mul(si.value[k], gf256::div(num, den)));
    }
    acc
}
