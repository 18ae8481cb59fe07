//! Structured error type shared by the whole pipeline.
//!
//! Every failure carries a taxonomy kind, a domain category, a stable
//! 16-bit code (rendered as `E-%04X`), a message, optional details and a
//! user-facing suggestion, plus the wrapped source error. Errors bubble
//! up unchanged; nothing in the pipeline swallows them.

use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

/// Failure taxonomy, independent of where the error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Internal,
    Io,
    Crypto,
    Format,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Io => "io",
            Self::Crypto => "crypto",
            Self::Format => "format",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain segment the error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Seal,
    Unseal,
    Reseal,
    Container,
    Compression,
    Integrity,
    Token,
    Shamir,
}

impl Category {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seal => "seal",
            Self::Unseal => "unseal",
            Self::Reseal => "reseal",
            Self::Container => "container",
            Self::Compression => "compression",
            Self::Integrity => "integrity",
            Self::Token => "token",
            Self::Shamir => "shamir",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error type carried through every `VaultResult`.
#[derive(Debug, Error)]
#[error("{kind} [{category} E-{code:04X}]: {message}")]
pub struct VaultError {
    pub kind: ErrorKind,
    pub category: Category,
    pub code: u16,
    pub message: String,
    pub details: String,
    pub suggestion: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl VaultError {
    pub fn new(
        kind: ErrorKind,
        category: Category,
        code: u16,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            category,
            code,
            message: message.into(),
            details: String::new(),
            suggestion: None,
            source: None,
        }
    }

    pub fn validation(
        category: Category,
        code: u16,
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::Validation, category, code, message).with_suggestion(suggestion)
    }

    pub fn internal(category: Category, code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, category, code, message)
    }

    pub fn io(category: Category, code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, category, code, message)
    }

    pub fn crypto(category: Category, code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Crypto, category, code, message)
    }

    pub fn format(category: Category, code: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Format, category, code, message)
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attaches the original error, preserving it through the bubble-up.
    #[must_use]
    pub fn wrap(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Stable `E-%04X` rendering of the code.
    pub fn code_str(&self) -> String {
        format!("E-{:04X}", self.code)
    }

    /// Single-line plaintext form for the log-writer.
    pub fn render_plaintext(&self, operation: &str) -> String {
        let mut line = format!(
            "[error] operation: {}; type: {}; category: {}; code: {}; message: {}",
            operation,
            self.kind,
            self.category,
            self.code_str(),
            self.message,
        );
        if !self.details.is_empty() {
            line.push_str(&format!("; details: {}", self.details));
        }
        if let Some(ref s) = self.suggestion {
            line.push_str(&format!("; suggestion: {s}"));
        }
        if let Some(ref src) = self.source {
            line.push_str(&format!("; wrapped: {src}"));
        }
        line
    }
}

impl Serialize for VaultError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.kind.as_str())?;
        map.serialize_entry("category", self.category.as_str())?;
        map.serialize_entry("code", &self.code_str())?;
        map.serialize_entry("message", &self.message)?;
        if !self.details.is_empty() {
            map.serialize_entry("details", &self.details)?;
        }
        if let Some(ref s) = self.suggestion {
            map.serialize_entry("suggestion", s)?;
        }
        if let Some(ref src) = self.source {
            map.serialize_entry("wrapped", &src.to_string())?;
        }
        map.end()
    }
}

/// Stable error codes, one per error site.
///
/// Grouping: 0x01xx container, 0x02xx compression, 0x03xx integrity,
/// 0x04xx token, 0x05xx shamir, 0x06xx seal, 0x07xx unseal, 0x08xx reseal,
/// 0x09xx option validation, 0x0Axx reader/writer plumbing.
pub mod codes {
    // container
    pub const HEADER_TOO_SHORT: u16 = 0x0101;
    pub const INVALID_SIGNATURE: u16 = 0x0102;
    pub const UNSUPPORTED_VERSION: u16 = 0x0103;
    pub const OPEN_CONTAINER_FILE: u16 = 0x0104;
    pub const READ_HEADER: u16 = 0x0105;
    pub const READ_METADATA: u16 = 0x0106;
    pub const METADATA_JSON: u16 = 0x0107;
    pub const READ_CIPHERTEXT: u16 = 0x0108;
    pub const WRITE_CONTAINER_FILE: u16 = 0x0109;
    pub const METADATA_TOO_LARGE: u16 = 0x010A;
    pub const AUTHENTICATION_FAILED: u16 = 0x010B;
    pub const SEAL_FAILED: u16 = 0x010C;
    pub const RANDOM_SOURCE: u16 = 0x010D;
    pub const KEY_LENGTH: u16 = 0x010F;

    // compression
    pub const ARCHIVE_PACK: u16 = 0x0201;
    pub const ARCHIVE_UNPACK: u16 = 0x0202;
    pub const PATH_TRAVERSAL: u16 = 0x0203;
    pub const UNKNOWN_COMPRESSION: u16 = 0x0204;
    pub const NONE_COMPRESSION_UNIMPLEMENTED: u16 = 0x0205;

    // integrity
    pub const UNKNOWN_PROVIDER: u16 = 0x0301;
    pub const ED25519_UNIMPLEMENTED: u16 = 0x0302;

    // token
    pub const TOKEN_JSON_SERIALIZE: u16 = 0x0401;
    pub const TOKEN_BASE64: u16 = 0x0402;
    pub const TOKEN_JSON_PARSE: u16 = 0x0403;
    pub const TOKEN_VERSION: u16 = 0x0404;
    pub const UNKNOWN_TOKEN_TYPE: u16 = 0x0405;
    pub const TOKEN_VALUE_HEX: u16 = 0x0406;
    pub const TOKEN_SIGNATURE_HEX: u16 = 0x0407;

    // shamir
    pub const SHAMIR_INVALID_PARAMS: u16 = 0x0501;
    pub const SHAMIR_NEED_SHARES: u16 = 0x0502;
    pub const SHAMIR_LENGTH_MISMATCH: u16 = 0x0503;
    pub const SHAMIR_DUPLICATE_ID: u16 = 0x0504;
    pub const SHAMIR_SIGNATURE_VERIFY: u16 = 0x0506;

    // seal
    pub const SEAL_COMPRESS_FOLDER: u16 = 0x0601;
    pub const SEAL_CREATE_CONTAINER: u16 = 0x0602;
    pub const SEAL_SPLIT_KEY: u16 = 0x0603;
    pub const SEAL_BUILD_TOKEN: u16 = 0x0604;
    pub const SEAL_WRITE_TOKENS: u16 = 0x0605;
    pub const SEAL_CREATE_PROVIDER: u16 = 0x0606;

    // unseal
    pub const UNSEAL_OPEN_CONTAINER: u16 = 0x0701;
    pub const UNSEAL_READ_TOKENS: u16 = 0x0702;
    pub const UNSEAL_PARSE_TOKEN: u16 = 0x0703;
    pub const UNSEAL_EMPTY_TOKEN_LIST: u16 = 0x0704;
    pub const UNSEAL_UNPACK_CONTENT: u16 = 0x0706;
    pub const UNSEAL_MASTER_KEY_HEX: u16 = 0x0707;
    pub const UNSEAL_MISSING_PASSPHRASE: u16 = 0x0708;

    // reseal
    pub const RESEAL_OPEN_CONTAINER: u16 = 0x0801;
    pub const RESEAL_REARCHIVE: u16 = 0x0803;
    pub const RESEAL_WRITE_CONTAINER: u16 = 0x0804;
    pub const RESEAL_REISSUE_TOKENS: u16 = 0x0805;

    // option validation
    pub const FOLDER_PATH_REQUIRED: u16 = 0x0901;
    pub const NEW_PATH_REQUIRED: u16 = 0x0902;
    pub const CURRENT_PATH_REQUIRED: u16 = 0x0903;
    pub const PASSPHRASE_REQUIRED: u16 = 0x0904;
    pub const INVALID_COMPRESSION_OPTION: u16 = 0x0905;
    pub const INVALID_INTEGRITY_OPTION: u16 = 0x0906;
    pub const INVALID_SHAMIR_OPTION: u16 = 0x0908;
    pub const INTEGRITY_PASSPHRASE_REQUIRED: u16 = 0x0909;
    pub const WRITER_PATH_REQUIRED: u16 = 0x090A;
    pub const INFO_PATH_REQUIRED: u16 = 0x090D;

    // reader/writer plumbing
    pub const WRITER_CREATE_FILE: u16 = 0x0A01;
    pub const WRITER_WRITE: u16 = 0x0A02;
    pub const READER_READ: u16 = 0x0A03;
    pub const WRITER_JSON: u16 = 0x0A04;
}
