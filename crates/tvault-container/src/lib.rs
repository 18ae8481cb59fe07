//! tvault-container: the on-disk container format.
//!
//! A container is three regions back to back: a fixed 47-byte little-endian
//! header, `metadata_size` bytes of plaintext JSON metadata, and the
//! AES-256-GCM ciphertext (payload plus 16-byte tag).
//!
//! ```text
//! +--------+------+----------------------------------+
//! | Offset | Size | Field                            |
//! +--------+------+----------------------------------+
//! | 0x00   | 4    | "TVLT" signature                 |
//! | 0x04   | 1    | version                          |
//! | 0x05   | 1    | flags (reserved)                 |
//! | 0x06   | 16   | salt (PBKDF2)                    |
//! | 0x16   | 4    | iterations (PBKDF2, u32 LE)      |
//! | 0x1A   | 1    | compression type                 |
//! | 0x1B   | 1    | integrity provider type          |
//! | 0x1C   | 1    | token type                       |
//! | 0x1D   | 12   | nonce (AES-GCM)                  |
//! | 0x29   | 4    | metadata length (u32 LE)         |
//! | 0x2D   | 1    | shares                           |
//! | 0x2E   | 1    | threshold                        |
//! | 0x2F   | N    | metadata JSON (plaintext)        |
//! | 0x2F+N | ...  | ciphertext + 16-byte GCM tag     |
//! +--------+------+----------------------------------+
//! ```

pub mod container;
pub mod header;
pub mod metadata;

pub use container::Container;
pub use header::{Header, HEADER_SIZE, SIGNATURE, VERSION};
pub use metadata::{Metadata, DEFAULT_COMMENT};
