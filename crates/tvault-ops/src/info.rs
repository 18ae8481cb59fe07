//! Info: header and metadata introspection without any key.

use std::path::Path;

use serde::Serialize;

use tvault_core::error::{codes, Category, VaultResult};
use tvault_core::io::{Format, Sink};
use tvault_container::{Container, Header, Metadata};

use crate::options::{required, InfoOptions};

/// Everything `container info` reports about a sealed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Information {
    pub name: String,
    pub version: u8,
    pub created_at: String,
    pub updated_at: String,
    pub comment: String,
    pub tags: Vec<String>,
    pub token_type: String,
    pub integrity_provider_type: String,
    pub compression_type: String,
    pub shares: u8,
    pub threshold: u8,
}

impl Information {
    pub fn from_parts(path: &Path, header: &Header, metadata: &Metadata) -> Self {
        let name = metadata.name.clone().unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        Self {
            name,
            version: header.version,
            created_at: metadata.created_at.to_rfc3339(),
            updated_at: metadata.updated_at.to_rfc3339(),
            comment: metadata.comment.clone(),
            tags: metadata.tags.clone(),
            token_type: header.token_type.name().to_owned(),
            integrity_provider_type: header.integrity_type.name().to_owned(),
            compression_type: header.compression_type.name().to_owned(),
            shares: header.shares,
            threshold: header.threshold,
        }
    }

    pub fn render_plaintext(&self) -> String {
        format!(
            "[container information]\n\
             Name: {}\n\
             Version: {}\n\
             Created at: {}\n\
             Updated at: {}\n\
             Comment: {}\n\
             Tags: {}\n\
             Token type: {}\n\
             Provider type: {}\n\
             Compression type: {}\n\
             Shares: {}\n\
             Threshold: {}",
            self.name,
            self.version,
            self.created_at,
            self.updated_at,
            self.comment,
            self.tags.join(","),
            self.token_type,
            self.integrity_provider_type,
            self.compression_type,
            self.shares,
            self.threshold,
        )
    }
}

/// Reads the container header and metadata into an [`Information`]
/// record. No decryption happens and no token is needed.
pub fn inspect(path: &Path) -> VaultResult<Information> {
    let (header, metadata) = Container::read_info(path)?;
    Ok(Information::from_parts(path, &header, &metadata))
}

/// Reports container information through the configured writer.
pub fn info(opts: &InfoOptions) -> VaultResult<()> {
    opts.validate()?;
    let path = opts
        .path
        .as_deref()
        .ok_or_else(|| required(Category::Container, codes::INFO_PATH_REQUIRED, "path"))?;

    let information = inspect(path)?;

    let mut sink = Sink::open(&opts.info_sink.target, opts.info_sink.format, Category::Container)?;
    match opts.info_sink.format {
        Format::Plaintext => sink.write_text(Category::Container, &information.render_plaintext()),
        Format::Json => sink.write_json(Category::Container, &information),
    }
}
