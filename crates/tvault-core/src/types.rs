//! Wire-level discriminators shared by the header, the token codec, and
//! the CLI. The byte values are part of the container format and must not
//! change.

use crate::error::{codes, Category, VaultError, VaultResult};

/// Compression backend recorded in the container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionType {
    /// Reserved; sealing without compression is unimplemented.
    None = 0x00,
    Zip = 0x01,
}

impl CompressionType {
    pub fn from_byte(b: u8) -> VaultResult<Self> {
        match b {
            0x00 => Ok(Self::None),
            0x01 => Ok(Self::Zip),
            other => Err(VaultError::format(
                Category::Compression,
                codes::UNKNOWN_COMPRESSION,
                format!("unknown compression type: 0x{other:02X}"),
            )),
        }
    }

    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zip => "zip",
        }
    }

    pub fn from_name(name: &str) -> VaultResult<Self> {
        match name {
            "none" => Ok(Self::None),
            "zip" => Ok(Self::Zip),
            other => Err(VaultError::format(
                Category::Compression,
                codes::UNKNOWN_COMPRESSION,
                format!("unknown compression type: {other}"),
            )),
        }
    }
}

/// Integrity provider attached to Shamir shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IntegrityType {
    None = 0x00,
    Hmac = 0x01,
    /// Reserved identifier; all operations fail until implemented.
    Ed25519 = 0x02,
}

impl IntegrityType {
    pub fn from_byte(b: u8) -> VaultResult<Self> {
        match b {
            0x00 => Ok(Self::None),
            0x01 => Ok(Self::Hmac),
            0x02 => Ok(Self::Ed25519),
            other => Err(VaultError::format(
                Category::Integrity,
                codes::UNKNOWN_PROVIDER,
                format!("unknown integrity provider: 0x{other:02X}"),
            )),
        }
    }

    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Hmac => "hmac",
            Self::Ed25519 => "ed25519",
        }
    }

    pub fn from_name(name: &str) -> VaultResult<Self> {
        match name {
            "none" => Ok(Self::None),
            "hmac" => Ok(Self::Hmac),
            "ed25519" => Ok(Self::Ed25519),
            other => Err(VaultError::format(
                Category::Integrity,
                codes::UNKNOWN_PROVIDER,
                format!("unknown integrity provider: {other}"),
            )),
        }
    }
}

/// Token scheme gating access to the data-encryption-key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TokenType {
    /// Passphrase only; no tokens are emitted.
    None = 0x00,
    /// (t, n) Shamir share tokens.
    Share = 0x01,
    /// A single token wrapping the key directly.
    Master = 0x02,
}

impl TokenType {
    pub fn from_byte(b: u8) -> VaultResult<Self> {
        match b {
            0x00 => Ok(Self::None),
            0x01 => Ok(Self::Share),
            0x02 => Ok(Self::Master),
            other => Err(VaultError::format(
                Category::Token,
                codes::UNKNOWN_TOKEN_TYPE,
                format!("unknown token type: 0x{other:02X}"),
            )),
        }
    }

    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Share => "share",
            Self::Master => "master",
        }
    }

    pub fn from_name(name: &str) -> VaultResult<Self> {
        match name {
            "none" => Ok(Self::None),
            "share" => Ok(Self::Share),
            "master" => Ok(Self::Master),
            other => Err(VaultError::format(
                Category::Token,
                codes::UNKNOWN_TOKEN_TYPE,
                format!("unknown token type: {other}"),
            )),
        }
    }
}
