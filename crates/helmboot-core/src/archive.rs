//! Streaming search-and-extract over tar and zip archives
//!
//! Entries are visited once, in the order the container stores them, and
//! the first one naming the target executable is copied out. Nothing after
//! the first match is read.

use std::fs::File;
use std::io::{self, Read, Seek, Write};

use crate::error::{CoreError, Result};
use crate::format::{self, Container, DetectedFormat};
use crate::platform::TargetDescriptor;

/// Information about an entry in an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path within the archive
    pub path: String,
    /// Uncompressed size in bytes
    pub size: u64,
    /// Whether this is a directory
    pub is_dir: bool,
}

/// The entry copied out of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntry {
    pub format: DetectedFormat,
    /// Path of the matching entry within the archive
    pub entry: String,
    /// Bytes written to the destination
    pub bytes: u64,
}

/// Detect the format of `reader` and copy the first entry matching `target`
/// into `dest`.
pub fn extract_first_match<R: Read, W: Write>(
    reader: R,
    target: &TargetDescriptor,
    dest: &mut W,
) -> Result<ExtractedEntry> {
    let (format, stream) = format::detect(reader)?;

    let (entry, bytes) = match format.container {
        Container::Tar => extract_from_tar(stream, target, dest)?,
        Container::Zip => extract_from_zip(stream, target, dest)?,
    };

    if bytes == 0 {
        return Err(CoreError::EmptyEntry { entry });
    }

    Ok(ExtractedEntry {
        format,
        entry,
        bytes,
    })
}

/// Detect the format of `reader` and list its entries in stored order.
pub fn list_entries<R: Read>(reader: R) -> Result<(DetectedFormat, Vec<ArchiveEntry>)> {
    let (format, stream) = format::detect(reader)?;

    let mut entries = Vec::new();
    match format.container {
        Container::Tar => {
            let mut archive = tar::Archive::new(stream);
            for entry in archive.entries()? {
                let entry = entry?;
                entries.push(ArchiveEntry {
                    path: entry.path()?.to_string_lossy().to_string(),
                    size: entry.header().size()?,
                    is_dir: entry.header().entry_type().is_dir(),
                });
            }
        }
        Container::Zip => {
            let mut archive = zip::ZipArchive::new(spool(stream)?)?;
            for i in 0..archive.len() {
                let file = archive.by_index(i)?;
                entries.push(ArchiveEntry {
                    path: file.name().to_string(),
                    size: file.size(),
                    is_dir: file.is_dir(),
                });
            }
        }
    }

    Ok((format, entries))
}

fn extract_from_tar<R: Read, W: Write>(
    stream: R,
    target: &TargetDescriptor,
    dest: &mut W,
) -> Result<(String, u64)> {
    let mut archive = tar::Archive::new(stream);

    // Advancing the iterator drains whatever is left of the previous entry
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.to_string_lossy().to_string();

        if !entry.header().entry_type().is_file() || !target.matches_entry(&path) {
            tracing::debug!("Skip archive entry with name: {}", path);
            continue;
        }

        tracing::debug!("Use archive entry with name: {}", path);
        let expected = entry.size();
        let bytes = io::copy(&mut entry, dest)?;
        if bytes != expected {
            return Err(CoreError::Archive {
                message: format!(
                    "entry {} is truncated ({} of {} bytes)",
                    path, bytes, expected
                ),
            });
        }
        return Ok((path, bytes));
    }

    Err(CoreError::BinaryNotFound {
        name: target.file_name().to_string(),
    })
}

fn extract_from_zip<R: Read, W: Write>(
    stream: R,
    target: &TargetDescriptor,
    dest: &mut W,
) -> Result<(String, u64)> {
    let mut archive = zip::ZipArchive::new(spool(stream)?)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let path = file.name().to_string();

        if !file.is_file() || !target.matches_entry(&path) {
            tracing::debug!("Skip archive entry with name: {}", path);
            continue;
        }

        tracing::debug!("Use archive entry with name: {}", path);
        let bytes = io::copy(&mut file, dest)?;
        return Ok((path, bytes));
    }

    Err(CoreError::BinaryNotFound {
        name: target.file_name().to_string(),
    })
}

/// Copy a zip stream into an anonymous temporary file.
///
/// The zip central directory is stored at the end of the archive, so entries
/// can only be enumerated reliably with random access.
fn spool<R: Read>(mut stream: R) -> Result<File> {
    let mut file = tempfile::tempfile()?;
    io::copy(&mut stream, &mut file)?;
    file.rewind()?;
    Ok(file)
}
