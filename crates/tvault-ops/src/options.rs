//! Option structs filled by the CLI and validated here.
//!
//! Every validation failure is a Validation error with a suggestion the
//! CLI can show verbatim.

use std::path::PathBuf;

use secrecy::SecretString;

use tvault_core::error::{codes, Category, VaultError, VaultResult};
use tvault_core::io::{Format, SinkTarget, Source};
use tvault_core::{CompressionType, IntegrityType, TokenType};

/// Where seal/reseal write the issued tokens, and in which format.
#[derive(Debug, Clone)]
pub struct TokenSink {
    pub target: SinkTarget,
    pub format: Format,
}

impl Default for TokenSink {
    fn default() -> Self {
        Self {
            target: SinkTarget::Stdout,
            format: Format::Json,
        }
    }
}

/// Options for `tvault-core seal`.
#[derive(Debug)]
pub struct SealOptions {
    pub folder_path: Option<PathBuf>,
    pub new_path: Option<PathBuf>,
    pub passphrase: Option<SecretString>,
    pub token_type: TokenType,
    pub compression_type: CompressionType,
    pub integrity_type: IntegrityType,
    /// Passphrase protecting the issued tokens (HMAC provider only).
    pub integrity_passphrase: Option<SecretString>,
    pub shares: u8,
    pub threshold: u8,
    pub token_sink: TokenSink,
}

impl Default for SealOptions {
    fn default() -> Self {
        Self {
            folder_path: None,
            new_path: None,
            passphrase: None,
            token_type: TokenType::Share,
            compression_type: CompressionType::Zip,
            integrity_type: IntegrityType::Hmac,
            integrity_passphrase: None,
            shares: 5,
            threshold: 3,
            token_sink: TokenSink::default(),
        }
    }
}

impl SealOptions {
    pub fn validate(&self) -> VaultResult<()> {
        if self.folder_path.is_none() {
            return Err(required(Category::Seal, codes::FOLDER_PATH_REQUIRED, "folder-path"));
        }
        if self.new_path.is_none() {
            return Err(required(Category::Seal, codes::NEW_PATH_REQUIRED, "new-path"));
        }
        if self.passphrase.is_none() {
            return Err(required(Category::Seal, codes::PASSPHRASE_REQUIRED, "passphrase"));
        }

        if self.compression_type != CompressionType::Zip {
            return Err(VaultError::validation(
                Category::Seal,
                codes::INVALID_COMPRESSION_OPTION,
                "compression type must be zip",
                "specify --compression-type zip",
            ));
        }

        if self.integrity_type == IntegrityType::Ed25519 {
            return Err(VaultError::validation(
                Category::Seal,
                codes::INVALID_INTEGRITY_OPTION,
                "integrity provider must be none or hmac",
                "specify --integrity-type {none|hmac}",
            ));
        }

        if self.token_type != TokenType::None
            && self.integrity_type == IntegrityType::Hmac
            && self.integrity_passphrase.is_none()
        {
            return Err(VaultError::validation(
                Category::Seal,
                codes::INTEGRITY_PASSPHRASE_REQUIRED,
                "integrity passphrase is required for the hmac provider",
                "specify --integrity-new-passphrase flag",
            ));
        }

        if self.token_type == TokenType::Share
            && (self.threshold < 2 || self.shares < self.threshold)
        {
            return Err(VaultError::validation(
                Category::Seal,
                codes::INVALID_SHAMIR_OPTION,
                "invalid threshold or number of shares",
                "choose 2 <= --threshold <= --shares <= 255",
            ));
        }

        validate_sink(Category::Seal, &self.token_sink.target)
    }
}

/// Options for `tvault-core unseal`.
#[derive(Debug)]
pub struct UnsealOptions {
    pub current_path: Option<PathBuf>,
    pub folder_path: Option<PathBuf>,
    /// Container passphrase; required only when the container was sealed
    /// with token type none.
    pub passphrase: Option<SecretString>,
    pub integrity_passphrase: Option<SecretString>,
    pub token_source: Option<Source>,
}

impl UnsealOptions {
    pub fn validate(&self) -> VaultResult<()> {
        if self.current_path.is_none() {
            return Err(required(Category::Unseal, codes::CURRENT_PATH_REQUIRED, "current-path"));
        }
        if self.folder_path.is_none() {
            return Err(required(Category::Unseal, codes::FOLDER_PATH_REQUIRED, "folder-path"));
        }
        Ok(())
    }
}

/// Options for `tvault-core reseal`.
#[derive(Debug)]
pub struct ResealOptions {
    pub current_path: Option<PathBuf>,
    pub new_path: Option<PathBuf>,
    pub folder_path: Option<PathBuf>,
    pub passphrase: Option<SecretString>,
    /// Metadata overrides; empty values keep the sealed ones.
    pub name: Option<String>,
    pub comment: Option<String>,
    pub tags: Option<Vec<String>>,
    pub integrity_current_passphrase: Option<SecretString>,
    pub integrity_new_passphrase: Option<SecretString>,
    pub token_source: Option<Source>,
    pub token_sink: TokenSink,
}

impl ResealOptions {
    pub fn validate(&self) -> VaultResult<()> {
        if self.current_path.is_none() {
            return Err(required(Category::Reseal, codes::CURRENT_PATH_REQUIRED, "current-path"));
        }
        if self.folder_path.is_none() {
            return Err(required(Category::Reseal, codes::FOLDER_PATH_REQUIRED, "folder-path"));
        }
        validate_sink(Category::Reseal, &self.token_sink.target)
    }
}

/// Options for `tvault-core container info`.
#[derive(Debug)]
pub struct InfoOptions {
    pub path: Option<PathBuf>,
    pub info_sink: TokenSink,
}

impl InfoOptions {
    pub fn validate(&self) -> VaultResult<()> {
        if self.path.is_none() {
            return Err(required(Category::Container, codes::INFO_PATH_REQUIRED, "path"));
        }
        validate_sink(Category::Container, &self.info_sink.target)
    }
}

pub(crate) fn required(category: Category, code: u16, flag: &str) -> VaultError {
    VaultError::validation(
        category,
        code,
        format!("{flag} is required"),
        format!("specify --{flag} flag"),
    )
}

fn validate_sink(category: Category, target: &SinkTarget) -> VaultResult<()> {
    if let SinkTarget::File(path) = target {
        if path.as_os_str().is_empty() {
            return Err(VaultError::validation(
                category,
                codes::WRITER_PATH_REQUIRED,
                "writer path is required for the file writer",
                "specify a --*-writer-path flag",
            ));
        }
    }
    Ok(())
}
