//! helmboot Core - Binary provisioning primitives
//!
//! This crate provides the pieces that turn a release archive into an
//! executable on disk:
//! - `Platform`: Host detection and the `TargetDescriptor` naming the executable
//! - `format`: Compression and container detection by magic bytes
//! - `archive`: Streaming search-and-extract of the first matching entry
//! - `permissions`: POSIX-bit and ACL "make executable" strategies
//! - `locator`: Reuse of an already installed binary
//! - `install`: Atomic install combining the above

pub mod archive;
pub mod error;
pub mod format;
pub mod install;
pub mod locator;
pub mod permissions;
pub mod platform;

pub use archive::{ArchiveEntry, ExtractedEntry, extract_first_match, list_entries};
pub use error::{CoreError, Result};
pub use format::{Compression, Container, DetectedFormat};
pub use install::{InstalledBinary, ensure_dir, install_from_reader};
pub use locator::{Located, binary_path, locate};
pub use permissions::{
    AclBackend, AclEntry, AclEntryType, AclGrant, Elevation, MakeExecutable, PermissionElevator,
    PermissionModel, PosixBits, Principal,
};
pub use platform::{OsFamily, Platform, TargetDescriptor};
