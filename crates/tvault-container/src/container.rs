//! Container file lifecycle: read, seal, open, write.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zeroize::Zeroizing;

use tvault_core::error::{codes, Category, VaultError, VaultResult};
use tvault_crypto::aead;
use tvault_crypto::DataKey;

use crate::header::{Header, HEADER_SIZE};
use crate::metadata::Metadata;

/// An in-memory container, owned by exactly one orchestrator call.
#[derive(Debug)]
pub struct Container {
    path: PathBuf,
    header: Header,
    metadata: Metadata,
    cipher_data: Vec<u8>,
}

impl Container {
    /// A container about to be sealed for the first time.
    pub fn create(path: impl Into<PathBuf>, header: Header, metadata: Metadata) -> Self {
        Self {
            path: path.into(),
            header,
            metadata,
            cipher_data: Vec::new(),
        }
    }

    /// Reads and validates an existing container file.
    ///
    /// The header is decoded (and rejected) before the metadata or
    /// ciphertext buffers are allocated.
    pub fn read(path: impl Into<PathBuf>) -> VaultResult<Self> {
        let path = path.into();
        let mut file = File::open(&path).map_err(|e| {
            VaultError::io(
                Category::Container,
                codes::OPEN_CONTAINER_FILE,
                format!("failed to open container {}", path.display()),
            )
            .wrap(e)
        })?;

        let mut header_bytes = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_bytes).map_err(|e| {
            VaultError::io(
                Category::Container,
                codes::READ_HEADER,
                "failed to read container header",
            )
            .wrap(e)
        })?;
        let header = Header::decode(&header_bytes)?;

        let mut meta_bytes = vec![0u8; header.metadata_size as usize];
        file.read_exact(&mut meta_bytes).map_err(|e| {
            VaultError::io(
                Category::Container,
                codes::READ_METADATA,
                "failed to read container metadata",
            )
            .wrap(e)
        })?;
        let metadata: Metadata = serde_json::from_slice(&meta_bytes).map_err(|e| {
            VaultError::format(
                Category::Container,
                codes::METADATA_JSON,
                "failed to parse container metadata",
            )
            .wrap(e)
        })?;

        let mut cipher_data = Vec::new();
        file.read_to_end(&mut cipher_data).map_err(|e| {
            VaultError::io(
                Category::Container,
                codes::READ_CIPHERTEXT,
                "failed to read container ciphertext",
            )
            .wrap(e)
        })?;

        debug!(
            path = %path.display(),
            metadata_size = header.metadata_size,
            ciphertext_len = cipher_data.len(),
            "container read"
        );

        Ok(Self {
            path,
            header,
            metadata,
            cipher_data,
        })
    }

    /// Reads only the header and metadata, for introspection without a
    /// key. The ciphertext is never loaded.
    pub fn read_info(path: &Path) -> VaultResult<(Header, Metadata)> {
        let mut file = File::open(path).map_err(|e| {
            VaultError::io(
                Category::Container,
                codes::OPEN_CONTAINER_FILE,
                format!("failed to open container {}", path.display()),
            )
            .wrap(e)
        })?;

        let mut header_bytes = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_bytes).map_err(|e| {
            VaultError::io(
                Category::Container,
                codes::READ_HEADER,
                "failed to read container header",
            )
            .wrap(e)
        })?;
        let header = Header::decode(&header_bytes)?;

        let mut meta_bytes = vec![0u8; header.metadata_size as usize];
        file.read_exact(&mut meta_bytes).map_err(|e| {
            VaultError::io(
                Category::Container,
                codes::READ_METADATA,
                "failed to read container metadata",
            )
            .wrap(e)
        })?;
        let metadata: Metadata = serde_json::from_slice(&meta_bytes).map_err(|e| {
            VaultError::format(
                Category::Container,
                codes::METADATA_JSON,
                "failed to parse container metadata",
            )
            .wrap(e)
        })?;

        Ok((header, metadata))
    }

    /// Seals the payload under `key` with a freshly sampled nonce.
    ///
    /// The nonce lands in the header, and the header is what gets written
    /// to disk, so the on-disk nonce is always the one that sealed the
    /// current ciphertext.
    pub fn encrypt(&mut self, data: &[u8], key: &DataKey) -> VaultResult<()> {
        self.header.refresh_nonce()?;
        self.cipher_data = aead::seal(key, &self.header.nonce, data)?;
        Ok(())
    }

    /// Opens the ciphertext under `key`.
    pub fn decrypt(&self, key: &DataKey) -> VaultResult<Zeroizing<Vec<u8>>> {
        aead::open(key, &self.header.nonce, &self.cipher_data).map(Zeroizing::new)
    }

    /// Writes header, metadata, and ciphertext to the container path.
    ///
    /// The file is created with mode 0600 and truncated. The header goes
    /// first so a partial write fails signature validation on open.
    pub fn write(&mut self) -> VaultResult<()> {
        let meta_bytes = serde_json::to_vec(&self.metadata).map_err(|e| {
            VaultError::internal(
                Category::Container,
                codes::METADATA_JSON,
                "failed to serialize container metadata",
            )
            .wrap(e)
        })?;

        let meta_len = u32::try_from(meta_bytes.len()).map_err(|e| {
            VaultError::format(
                Category::Container,
                codes::METADATA_TOO_LARGE,
                "container metadata exceeds u32 size limit",
            )
            .wrap(e)
        })?;
        self.header.metadata_size = meta_len;

        let mut file = create_private(&self.path)?;
        file.write_all(&self.header.encode())
            .and_then(|()| file.write_all(&meta_bytes))
            .and_then(|()| file.write_all(&self.cipher_data))
            .map_err(|e| {
                VaultError::io(
                    Category::Container,
                    codes::WRITE_CONTAINER_FILE,
                    format!("failed to write container {}", self.path.display()),
                )
                .wrap(e)
            })?;

        debug!(path = %self.path.display(), bytes = HEADER_SIZE + meta_bytes.len() + self.cipher_data.len(), "container written");

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
    }

    pub const fn header(&self) -> &Header {
        &self.header
    }

    pub fn cipher_data(&self) -> &[u8] {
        &self.cipher_data
    }

    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

fn create_private(path: &Path) -> VaultResult<File> {
    let open_err = |e: std::io::Error| {
        VaultError::io(
            Category::Container,
            codes::WRITE_CONTAINER_FILE,
            format!("failed to create container {}", path.display()),
        )
        .wrap(e)
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(open_err)
    }

    #[cfg(not(unix))]
    {
        File::create(path).map_err(open_err)
    }
}
