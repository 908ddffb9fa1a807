//! Atomic installation of an executable from an archive stream
//!
//! The matching entry is written to a temporary file next to its final
//! location, made executable, and only then renamed into place. A failed
//! install leaves nothing at the final path.

use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::archive::{self, ExtractedEntry};
use crate::error::{CoreError, Result};
use crate::locator;
use crate::permissions::{Elevation, PermissionElevator};
use crate::platform::TargetDescriptor;

/// A binary written by [`install_from_reader`].
#[derive(Debug, Clone)]
pub struct InstalledBinary {
    pub path: PathBuf,
    pub source: ExtractedEntry,
    pub elevation: Elevation,
}

/// Create `dir` and its parents if absent.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        tracing::info!("Creating directory {}", dir.display());
    }
    std::fs::create_dir_all(dir).map_err(|source| CoreError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Extract `target` from the archive stream `reader` into `install_dir`.
pub fn install_from_reader<R: Read>(
    reader: R,
    target: &TargetDescriptor,
    install_dir: &Path,
    elevator: &PermissionElevator,
) -> Result<InstalledBinary> {
    ensure_dir(install_dir)?;
    let path = locator::binary_path(install_dir, target);

    let staged = stage_file(install_dir, target).map_err(|source| CoreError::Write {
        path: install_dir.to_path_buf(),
        source,
    })?;

    let source = {
        let mut out = BufWriter::new(staged.as_file());
        let extracted = archive::extract_first_match(reader, target, &mut out)?;
        out.flush().map_err(|source| CoreError::Write {
            path: staged.path().to_path_buf(),
            source,
        })?;
        extracted
    };
    staged.as_file().sync_all().map_err(|source| CoreError::Write {
        path: staged.path().to_path_buf(),
        source,
    })?;

    let elevation = elevator.elevate(staged.path())?;

    staged.persist(&path).map_err(|e| CoreError::Write {
        path: path.clone(),
        source: e.error,
    })?;

    tracing::info!(
        "Installed {} from {} ({} bytes)",
        path.display(),
        source.entry,
        source.bytes
    );

    Ok(InstalledBinary {
        path,
        source,
        elevation,
    })
}

/// Create the temporary file the entry is extracted into.
///
/// On unix the file is created with 0666 less the umask, like any other file
/// the process writes, rather than the 0600 temporary files default to.
fn stage_file(install_dir: &Path, target: &TargetDescriptor) -> std::io::Result<NamedTempFile> {
    let prefix = format!(".{}.", target.file_name());
    let mut builder = tempfile::Builder::new();
    builder.prefix(&prefix);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(install_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{OsFamily, Platform};
    use flate2::write::GzEncoder;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn posix() -> Platform {
        Platform::new(OsFamily::Posix, "linux", "amd64")
    }

    fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, *content).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_install_creates_executable() {
        let temp = TempDir::new().unwrap();
        let install_dir = temp.path().join("target/helm");
        let platform = posix();
        let target = TargetDescriptor::helm(&platform);
        let archive = tar_gz(&[("tools/helm", b"#!/bin/sh\necho helm\n")]);

        let installed = install_from_reader(
            Cursor::new(archive),
            &target,
            &install_dir,
            &PermissionElevator::for_platform(&platform),
        )
        .unwrap();

        assert_eq!(installed.path, install_dir.join("helm"));
        assert_eq!(installed.source.entry, "tools/helm");
        assert_eq!(
            std::fs::read(&installed.path).unwrap(),
            b"#!/bin/sh\necho helm\n"
        );
        assert_eq!(dir_names(&install_dir), vec!["helm"]);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&installed.path).unwrap().permissions().mode();
            assert_ne!(mode & 0o100, 0);
            assert_eq!(installed.elevation, Elevation::Applied);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_installed_mode_matches_a_created_file() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let platform = posix();
        let archive = tar_gz(&[("linux-amd64/helm", b"binary")]);

        let installed = install_from_reader(
            Cursor::new(archive),
            &TargetDescriptor::helm(&platform),
            temp.path(),
            &PermissionElevator::for_platform(&platform),
        )
        .unwrap();

        let created = temp.path().join("created");
        std::fs::write(&created, b"").unwrap();
        let mode = |path: &Path| std::fs::metadata(path).unwrap().permissions().mode() & 0o777;

        // Group and other bits follow the umask, only owner-execute is added
        assert_eq!(mode(&installed.path), mode(&created) | 0o100);
    }

    #[test]
    fn test_failed_install_leaves_no_file() {
        let temp = TempDir::new().unwrap();
        let platform = posix();
        let target = TargetDescriptor::helm(&platform);
        let archive = tar_gz(&[("tools/tiller", b"tiller")]);

        let err = install_from_reader(
            Cursor::new(archive),
            &target,
            temp.path(),
            &PermissionElevator::for_platform(&platform),
        )
        .unwrap_err();

        assert!(matches!(err, CoreError::BinaryNotFound { .. }));
        assert!(dir_names(temp.path()).is_empty());
    }

    #[test]
    fn test_truncated_archive_leaves_no_file() {
        let temp = TempDir::new().unwrap();
        let platform = posix();
        let target = TargetDescriptor::helm(&platform);
        let payload = vec![0x42u8; 64 * 1024];
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_size(payload.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "tools/helm", &payload[..]).unwrap();
        let mut archive = builder.into_inner().unwrap();
        archive.truncate(512 + 1000);

        let result = install_from_reader(
            Cursor::new(archive),
            &target,
            temp.path(),
            &PermissionElevator::for_platform(&platform),
        );

        assert!(result.is_err());
        assert!(!temp.path().join("helm").exists());
        assert!(dir_names(temp.path()).is_empty());
    }

    #[test]
    fn test_unsupported_archive_creates_directory_only() {
        let temp = TempDir::new().unwrap();
        let install_dir = temp.path().join("bin");
        let platform = posix();

        let err = install_from_reader(
            Cursor::new(b"<html>not found</html>".to_vec()),
            &TargetDescriptor::helm(&platform),
            &install_dir,
            &PermissionElevator::for_platform(&platform),
        )
        .unwrap_err();

        assert!(matches!(err, CoreError::UnrecognizedArchive { .. }));
        assert!(install_dir.is_dir());
        assert!(dir_names(&install_dir).is_empty());
    }

    #[test]
    fn test_ensure_dir_error_names_path() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let err = ensure_dir(&blocker.join("sub")).unwrap_err();
        assert!(err.to_string().contains("file"));
        assert!(matches!(err, CoreError::CreateDir { .. }));
    }
}
