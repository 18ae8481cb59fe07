//! Token codec: typed struct → compact JSON → AES-256-CTR → base64.
//!
//! A token exists in three serialized forms: the `Token` struct, its JSON
//! text, and the base64-encoded (optionally encrypted) string that appears
//! in a token list. `build` produces the raw (possibly encrypted) bytes;
//! callers base64-encode them for transport. `parse` reverses the chain.

use aes::Aes256;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ctr::cipher::{KeyIvInit, StreamCipher};
use serde::{Deserialize, Serialize};

use tvault_core::error::{codes, Category, VaultError, VaultResult};

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// Current token wire version.
pub const VERSION: u32 = 1;

/// A token as carried inside the token list.
///
/// Field names are the wire format: `id` is omitted when 0 (master tokens)
/// and `s` when empty, matching tokens issued by earlier releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "v")]
    pub version: u32,
    #[serde(rename = "id", default, skip_serializing_if = "id_is_zero")]
    pub id: u8,
    #[serde(rename = "t")]
    pub token_type: u8,
    /// Hex-encoded share value or master key.
    #[serde(rename = "vl")]
    pub value: String,
    /// Hex-encoded signature; empty for master tokens.
    #[serde(rename = "s", default, skip_serializing_if = "String::is_empty")]
    pub signature: String,
    #[serde(rename = "pid")]
    pub provider_id: u8,
}

fn id_is_zero(id: &u8) -> bool {
    *id == 0
}

/// Serializes a token to JSON and encrypts it when a key is present.
pub fn build(token: &Token, key: Option<&[u8]>) -> VaultResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec(token).map_err(|e| {
        VaultError::internal(
            Category::Token,
            codes::TOKEN_JSON_SERIALIZE,
            "failed to serialize token to JSON",
        )
        .wrap(e)
    })?;

    match key {
        Some(key) if !key.is_empty() => {
            apply_ctr(key, &mut bytes)?;
            Ok(bytes)
        }
        _ => Ok(bytes),
    }
}

/// Parses a base64-encoded token, decrypting when a key is present.
pub fn parse(encoded: &str, key: Option<&[u8]>) -> VaultResult<Token> {
    let mut bytes = STANDARD.decode(encoded.trim()).map_err(|e| {
        VaultError::format(
            Category::Token,
            codes::TOKEN_BASE64,
            "failed to decode base64 token",
        )
        .wrap(e)
    })?;

    if let Some(key) = key {
        if !key.is_empty() {
            apply_ctr(key, &mut bytes)?;
        }
    }

    let token: Token = serde_json::from_slice(&bytes).map_err(|e| {
        VaultError::format(
            Category::Token,
            codes::TOKEN_JSON_PARSE,
            "failed to parse token JSON",
        )
        .wrap(e)
    })?;

    if token.version != VERSION {
        return Err(VaultError::format(
            Category::Token,
            codes::TOKEN_VERSION,
            format!("invalid token version: {}", token.version),
        ));
    }

    Ok(token)
}

/// AES-256-CTR keystream with a zero IV, applied in place.
///
/// The zero IV is safe only because the token-encryption key is derived
/// from the integrity passphrase plus the per-container salt: one key
/// never encrypts tokens of two different containers. Reusing a token key
/// across containers would break this.
fn apply_ctr(key: &[u8], data: &mut [u8]) -> VaultResult<()> {
    let iv = [0u8; 16];
    let mut cipher = Aes256Ctr::new_from_slices(key, &iv).map_err(|e| {
        VaultError::crypto(
            Category::Token,
            codes::KEY_LENGTH,
            "token encryption key must be 32 bytes",
        )
        .wrap(e)
    })?;
    cipher.apply_keystream(data);
    Ok(())
}

/// Ordered token list as written by seal and read back by unseal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenList {
    pub token_list: Vec<String>,
}

impl TokenList {
    pub const fn new(token_list: Vec<String>) -> Self {
        Self { token_list }
    }

    /// Plaintext wire form: tokens joined by `|`.
    pub fn to_plaintext(&self) -> String {
        self.token_list.join("|")
    }

    pub fn from_plaintext(text: &str) -> Self {
        Self {
            token_list: text
                .split('|')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }

    pub fn from_json(text: &str) -> VaultResult<Self> {
        serde_json::from_str(text).map_err(|e| {
            VaultError::format(
                Category::Token,
                codes::TOKEN_JSON_PARSE,
                "failed to parse token list JSON",
            )
            .wrap(e)
        })
    }
}
