//! tvault-core: shared foundation for the Trust Vault workspace
//!
//! Holds what every other crate needs and nothing more: the structured
//! error taxonomy, the wire-level type discriminators, and the small
//! reader/writer abstractions behind the token/log/info channels.

pub mod error;
pub mod io;
pub mod types;

pub use error::{codes, Category, ErrorKind, VaultError, VaultResult};
pub use types::{CompressionType, IntegrityType, TokenType};

/// PBKDF2 iteration count used for every key derivation.
pub const ITERATIONS: u32 = 100_000;

/// Size of the data-encryption-key and token-encryption-key in bytes (256-bit).
pub const KEY_LEN: usize = 32;

/// Size of the PBKDF2 salt stored in the container header.
pub const SALT_LEN: usize = 16;

/// Size of the AES-GCM nonce stored in the container header.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-GCM authentication tag appended to the ciphertext.
pub const TAG_LEN: usize = 16;
