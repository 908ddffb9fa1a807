//! Reuse of a previously installed binary

use std::path::{Path, PathBuf};

use crate::platform::TargetDescriptor;

/// Outcome of looking for an installed binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// A file already exists at the expected path.
    Present(PathBuf),
    /// Nothing at the expected path; it must be provisioned.
    Absent(PathBuf),
}

impl Located {
    /// The expected binary path, whether or not it exists.
    pub fn path(&self) -> &Path {
        match self {
            Located::Present(path) | Located::Absent(path) => path,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Located::Present(_))
    }
}

/// Expected location of `target` inside `install_dir`.
#[must_use]
pub fn binary_path(install_dir: &Path, target: &TargetDescriptor) -> PathBuf {
    install_dir.join(target.file_name())
}

/// Check whether `target` is already installed in `install_dir`.
///
/// Existence only: the version and contents are not inspected.
#[must_use]
pub fn locate(install_dir: &Path, target: &TargetDescriptor) -> Located {
    let path = binary_path(install_dir, target);
    if path.exists() {
        Located::Present(path)
    } else {
        Located::Absent(path)
    }
}
