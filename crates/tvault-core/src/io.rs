//! Reader/writer plumbing for the token, log, and info channels.
//!
//! Tokens and reports travel through a `Sink` (stdout or file) in one of
//! two wire formats; tokens come back in through a `Source` (file, stdin,
//! or a CLI flag). The orchestrators stay agnostic of where bytes go.

use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{codes, Category, VaultError, VaultResult};

/// Wire format shared by every reader and writer channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    Plaintext,
    #[default]
    Json,
}

impl Format {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plaintext => "plaintext",
            Self::Json => "json",
        }
    }
}

/// Where a channel writes to.
#[derive(Debug, Clone)]
pub enum SinkTarget {
    Stdout,
    File(PathBuf),
}

/// A formatted output channel.
pub struct Sink {
    writer: Box<dyn Write>,
    format: Format,
}

impl Sink {
    pub fn open(target: &SinkTarget, format: Format, category: Category) -> VaultResult<Self> {
        let writer: Box<dyn Write> = match target {
            SinkTarget::Stdout => Box::new(std::io::stdout()),
            SinkTarget::File(path) => Box::new(
                File::create(path).map_err(|e| {
                    VaultError::io(
                        category,
                        codes::WRITER_CREATE_FILE,
                        format!("failed to create output file {}", path.display()),
                    )
                    .wrap(e)
                })?,
            ),
        };

        Ok(Self { writer, format })
    }

    pub const fn format(&self) -> Format {
        self.format
    }

    /// Writes a plaintext line followed by a newline.
    pub fn write_text(&mut self, category: Category, text: &str) -> VaultResult<()> {
        writeln!(self.writer, "{text}")
            .and_then(|()| self.writer.flush())
            .map_err(|e| {
                VaultError::io(category, codes::WRITER_WRITE, "failed to write output").wrap(e)
            })
    }

    /// Serializes the value as a single JSON object followed by a newline.
    pub fn write_json<T: Serialize>(&mut self, category: Category, value: &T) -> VaultResult<()> {
        let json = serde_json::to_string(value).map_err(|e| {
            VaultError::internal(category, codes::WRITER_JSON, "failed to serialize output").wrap(e)
        })?;
        self.write_text(category, &json)
    }
}

/// Where a channel reads from.
#[derive(Debug, Clone)]
pub enum SourceTarget {
    File(PathBuf),
    Stdin,
    /// Token material passed directly on the command line.
    Flag(String),
}

/// A formatted input channel.
#[derive(Debug, Clone)]
pub struct Source {
    target: SourceTarget,
    format: Format,
}

impl Source {
    pub const fn new(target: SourceTarget, format: Format) -> Self {
        Self { target, format }
    }

    pub const fn format(&self) -> Format {
        self.format
    }

    pub fn read_to_string(&self, category: Category) -> VaultResult<String> {
        match &self.target {
            SourceTarget::Flag(value) => Ok(value.clone()),
            SourceTarget::Stdin => {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf).map_err(|e| {
                    VaultError::io(category, codes::READER_READ, "failed to read from stdin")
                        .wrap(e)
                })?;
                Ok(buf)
            }
            SourceTarget::File(path) => std::fs::read_to_string(path).map_err(|e| {
                VaultError::io(
                    category,
                    codes::READER_READ,
                    format!("failed to read token file {}", path.display()),
                )
                .wrap(e)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Report {
        status: &'static str,
    }

    #[test]
    fn test_file_sink_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        let mut sink = Sink::open(
            &SinkTarget::File(path.clone()),
            Format::Plaintext,
            Category::Seal,
        )
        .unwrap();
        sink.write_text(Category::Seal, "token-a|token-b").unwrap();
        drop(sink);

        assert_eq!(std::fs::read_to_string(path).unwrap(), "token-a|token-b\n");
    }

    #[test]
    fn test_file_sink_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        let mut sink =
            Sink::open(&SinkTarget::File(path.clone()), Format::Json, Category::Seal).unwrap();
        sink.write_json(Category::Seal, &Report { status: "ok" }).unwrap();
        drop(sink);

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.trim(), r#"{"status":"ok"}"#);
    }

    #[test]
    fn test_source_flag_and_file() {
        let flag = Source::new(SourceTarget::Flag("abc".into()), Format::Plaintext);
        assert_eq!(flag.read_to_string(Category::Unseal).unwrap(), "abc");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, r#"{"token_list":[]}"#).unwrap();
        let file = Source::new(SourceTarget::File(path), Format::Json);
        assert_eq!(
            file.read_to_string(Category::Unseal).unwrap(),
            r#"{"token_list":[]}"#
        );
    }

    #[test]
    fn test_missing_token_file_is_io_error() {
        let src = Source::new(
            SourceTarget::File(PathBuf::from("/nonexistent/tokens.json")),
            Format::Json,
        );
        let err = src.read_to_string(Category::Unseal).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Io);
        assert_eq!(err.code, codes::READER_READ);
    }
}
