//! tvault-archive: deterministic folder ↔ ZIP byte-buffer codec.
//!
//! `pack` walks the folder in sorted order with fixed entry timestamps, so
//! the same tree always produces the same archive bytes. `unpack` refuses
//! any entry that would escape the target directory (Zip-Slip).

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Component, Path};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use tvault_core::error::{codes, Category, VaultError, VaultResult};

/// Mode for directories created during unpack.
const DIR_MODE: u32 = 0o750;

fn pack_err(message: impl Into<String>) -> VaultError {
    VaultError::io(Category::Compression, codes::ARCHIVE_PACK, message)
}

fn unpack_err(message: impl Into<String>) -> VaultError {
    VaultError::io(Category::Compression, codes::ARCHIVE_UNPACK, message)
}

/// Packs a folder into an in-memory ZIP archive.
///
/// Entry names are relative to `folder` with `/` separators; entries are
/// emitted in sorted order with zeroed timestamps so the archive is a pure
/// function of the tree contents.
pub fn pack(folder: &Path) -> VaultResult<Vec<u8>> {
    let mut zw = ZipWriter::new(Cursor::new(Vec::new()));

    for entry in WalkDir::new(folder).sort_by_file_name() {
        let entry = entry.map_err(|e| pack_err("failed to walk folder").wrap(e))?;
        let path = entry.path();
        if path == folder {
            continue;
        }

        let name = relative_name(folder, path)?;
        let options = entry_options(path)?;

        if entry.file_type().is_dir() {
            zw.add_directory(name.as_str(), options)
                .map_err(|e| pack_err(format!("failed to add directory {name}")).wrap(e))?;
            continue;
        }

        zw.start_file(name.as_str(), options)
            .map_err(|e| pack_err(format!("failed to start entry {name}")).wrap(e))?;

        let mut file = fs::File::open(path)
            .map_err(|e| pack_err(format!("failed to open {}", path.display())).wrap(e))?;
        std::io::copy(&mut file, &mut zw)
            .map_err(|e| pack_err(format!("failed to copy {}", path.display())).wrap(e))?;
    }

    let cursor = zw
        .finish()
        .map_err(|e| pack_err("failed to finish archive").wrap(e))?;

    Ok(cursor.into_inner())
}

/// Extracts an archive into `target`, creating it if needed.
pub fn unpack(data: &[u8], target: &Path) -> VaultResult<()> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| unpack_err("failed to read archive").wrap(e))?;

    create_dir(target)?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| unpack_err(format!("failed to read entry {i}")).wrap(e))?;

        // Zip-Slip guard: the resolved path must stay under the target.
        let Some(relative) = entry.enclosed_name() else {
            return Err(VaultError::format(
                Category::Compression,
                codes::PATH_TRAVERSAL,
                format!("illegal entry path: {}", entry.name()),
            ));
        };
        let path = target.join(relative);

        if entry.is_dir() {
            create_dir(&path)?;
            continue;
        }

        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }

        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buf)
            .map_err(|e| unpack_err(format!("failed to read entry {}", entry.name())).wrap(e))?;

        let mut out = fs::File::create(&path)
            .map_err(|e| unpack_err(format!("failed to create {}", path.display())).wrap(e))?;
        out.write_all(&buf)
            .map_err(|e| unpack_err(format!("failed to write {}", path.display())).wrap(e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(mode))
                .map_err(|e| unpack_err(format!("failed to chmod {}", path.display())).wrap(e))?;
        }
    }

    Ok(())
}

/// Relative entry name with `/` separators; rejects `..` segments.
fn relative_name(folder: &Path, path: &Path) -> VaultResult<String> {
    let relative = path
        .strip_prefix(folder)
        .map_err(|e| pack_err(format!("path outside folder: {}", path.display())).wrap(e))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                return Err(VaultError::format(
                    Category::Compression,
                    codes::PATH_TRAVERSAL,
                    format!("path contains prohibited sequences: {}", path.display()),
                ));
            }
            _ => {}
        }
    }

    Ok(parts.join("/"))
}

fn entry_options(path: &Path) -> VaultResult<SimpleFileOptions> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let meta = fs::metadata(path)
            .map_err(|e| pack_err(format!("failed to stat {}", path.display())).wrap(e))?;
        return Ok(options.unix_permissions(meta.permissions().mode()));
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(options)
    }
}

fn create_dir(path: &Path) -> VaultResult<()> {
    if path.exists() {
        return Ok(());
    }
    fs::create_dir_all(path)
        .map_err(|e| unpack_err(format!("failed to create directory {}", path.display())).wrap(e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(DIR_MODE))
            .map_err(|e| unpack_err(format!("failed to chmod {}", path.display())).wrap(e))?;
    }

    Ok(())
}
