//! Fixed-layout container header.
//!
//! Older 45/46-byte layouts without an explicit token type are
//! unsupported: they fail the version check on decode.

use tvault_core::error::{codes, Category, VaultError, VaultResult};
use tvault_core::{CompressionType, IntegrityType, TokenType, ITERATIONS, NONCE_LEN, SALT_LEN};
use tvault_crypto::random_array;

/// Signature bytes at the start of every container.
pub const SIGNATURE: [u8; 4] = *b"TVLT";

/// Current container format version.
pub const VERSION: u8 = 1;

/// Total header size in bytes; the metadata region starts at this offset.
pub const HEADER_SIZE: usize = 47;

/// Parsed container header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    /// Reserved; written as 0, ignored on read.
    pub flags: u8,
    pub salt: [u8; SALT_LEN],
    pub iterations: u32,
    pub compression_type: CompressionType,
    pub integrity_type: IntegrityType,
    pub token_type: TokenType,
    pub nonce: [u8; NONCE_LEN],
    pub metadata_size: u32,
    /// Shamir n; 0 unless the token type is share.
    pub shares: u8,
    /// Shamir t; 0 unless the token type is share.
    pub threshold: u8,
}

impl Header {
    /// Builds a header for a fresh seal: random salt and nonce, current
    /// version, 100k PBKDF2 iterations.
    pub fn new(
        compression_type: CompressionType,
        integrity_type: IntegrityType,
        token_type: TokenType,
        shares: u8,
        threshold: u8,
    ) -> VaultResult<Self> {
        Ok(Self {
            version: VERSION,
            flags: 0,
            salt: random_array(Category::Container)?,
            iterations: ITERATIONS,
            compression_type,
            integrity_type,
            token_type,
            nonce: random_array(Category::Container)?,
            metadata_size: 0,
            shares,
            threshold,
        })
    }

    /// Replaces the nonce with fresh random bytes.
    ///
    /// Called before every seal of the payload: reusing a nonce under the
    /// same key breaks GCM, so the header regenerates it on every write.
    pub fn refresh_nonce(&mut self) -> VaultResult<()> {
        self.nonce = random_array(Category::Container)?;
        Ok(())
    }

    /// Encodes the header into its wire layout.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&SIGNATURE);
        buf[4] = self.version;
        buf[5] = self.flags;
        buf[6..22].copy_from_slice(&self.salt);
        buf[22..26].copy_from_slice(&self.iterations.to_le_bytes());
        buf[26] = self.compression_type.as_byte();
        buf[27] = self.integrity_type.as_byte();
        buf[28] = self.token_type.as_byte();
        buf[29..41].copy_from_slice(&self.nonce);
        buf[41..45].copy_from_slice(&self.metadata_size.to_le_bytes());
        buf[45] = self.shares;
        buf[46] = self.threshold;
        buf
    }

    /// Decodes a header, validating signature, version, and every
    /// discriminator before the caller allocates anything else.
    pub fn decode(bytes: &[u8]) -> VaultResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(VaultError::format(
                Category::Container,
                codes::HEADER_TOO_SHORT,
                format!("container header too short: {} bytes", bytes.len()),
            ));
        }

        if bytes[0..4] != SIGNATURE {
            return Err(VaultError::format(
                Category::Container,
                codes::INVALID_SIGNATURE,
                "invalid container signature",
            ));
        }

        let version = bytes[4];
        if version != VERSION {
            return Err(VaultError::format(
                Category::Container,
                codes::UNSUPPORTED_VERSION,
                format!("unsupported container version: {version}"),
            ));
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[6..22]);
        let iterations = u32::from_le_bytes([bytes[22], bytes[23], bytes[24], bytes[25]]);

        let compression_type = CompressionType::from_byte(bytes[26])?;
        let integrity_type = IntegrityType::from_byte(bytes[27])?;
        let token_type = TokenType::from_byte(bytes[28])?;

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[29..41]);
        let metadata_size = u32::from_le_bytes([bytes[41], bytes[42], bytes[43], bytes[44]]);

        Ok(Self {
            version,
            flags: bytes[5],
            salt,
            iterations,
            compression_type,
            integrity_type,
            token_type,
            nonce,
            metadata_size,
            shares: bytes[45],
            threshold: bytes[46],
        })
    }
}
