//! Making an extracted file executable
//!
//! The host's permission model is probed once and dispatched to one of two
//! strategies behind [`MakeExecutable`]:
//!
//! - **POSIX bits**: add the owner-execute bit, keep every other bit
//! - **ACL**: append an allow-execute entry for the current user, keep every
//!   existing entry
//!
//! A filesystem that reports the operation as unsupported is not an error:
//! the file keeps the permissions extraction gave it.

use std::io;
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::platform::{OsFamily, Platform};

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use self::windows::WindowsAcl;

/// `FILE_EXECUTE` access right.
pub const EXECUTE_MASK: u32 = 0x0020;

/// Owner-execute permission bit.
pub const OWNER_EXECUTE: u32 = 0o100;

/// Permission model exposed by the host filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionModel {
    Posix,
    Acl,
    Unavailable,
}

impl PermissionModel {
    /// Probe which model applies on `platform`.
    #[must_use]
    pub fn probe(platform: &Platform) -> Self {
        match platform.family {
            OsFamily::Posix => PermissionModel::Posix,
            OsFamily::Windows => PermissionModel::Acl,
            OsFamily::Unknown => PermissionModel::Unavailable,
        }
    }
}

/// Result of an elevation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    /// The execute permission was granted.
    Applied,
    /// The filesystem does not support the model; nothing changed.
    Unsupported,
}

/// A strategy granting the current user execute permission on a file.
pub trait MakeExecutable {
    fn make_executable(&self, path: &Path) -> Result<Elevation>;
}

/// POSIX permission-bit strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixBits;

impl MakeExecutable for PosixBits {
    #[cfg(unix)]
    fn make_executable(&self, path: &Path) -> Result<Elevation> {
        use std::os::unix::fs::PermissionsExt;

        let mut permissions = std::fs::metadata(path)
            .map_err(|e| permission_error(path, &e))?
            .permissions();
        permissions.set_mode(permissions.mode() | OWNER_EXECUTE);

        match std::fs::set_permissions(path, permissions) {
            Ok(()) => Ok(Elevation::Applied),
            Err(e) if e.kind() == io::ErrorKind::Unsupported => {
                tracing::debug!("Exec file permission is not set on {}: {}", path.display(), e);
                Ok(Elevation::Unsupported)
            }
            Err(e) => Err(permission_error(path, &e)),
        }
    }

    #[cfg(not(unix))]
    fn make_executable(&self, path: &Path) -> Result<Elevation> {
        tracing::debug!("POSIX permissions are not available for {}", path.display());
        Ok(Elevation::Unsupported)
    }
}

/// Type of an access-control entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclEntryType {
    Allow,
    Deny,
}

/// The account an access-control entry applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Account name, resolved by the system when the list is written.
    Name(String),
    /// Security identifier bytes, kept as read so accounts without a name
    /// survive a rewrite.
    Sid(Vec<u8>),
}

/// A single explicit access-control entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    pub principal: Principal,
    pub kind: AclEntryType,
    /// Access mask (Windows access rights).
    pub mask: u32,
    /// Inheritance flags as read from the list.
    pub inheritance: u32,
}

impl AclEntry {
    /// An entry allowing `principal` to execute the file.
    pub fn allow_execute(principal: Principal) -> Self {
        Self {
            principal,
            kind: AclEntryType::Allow,
            mask: EXECUTE_MASK,
            inheritance: 0,
        }
    }
}

/// Access to a filesystem's access-control lists.
pub trait AclBackend {
    /// The user running this process.
    fn current_principal(&self) -> io::Result<Principal>;

    /// The explicit entries currently on `path`, in order.
    fn read_acl(&self, path: &Path) -> io::Result<Vec<AclEntry>>;

    /// Replace the explicit entries on `path`.
    fn write_acl(&self, path: &Path, entries: &[AclEntry]) -> io::Result<()>;
}

/// ACL strategy: read the list, append an allow-execute entry, write it back.
#[derive(Debug, Clone, Default)]
pub struct AclGrant<B> {
    backend: B,
}

impl<B: AclBackend> AclGrant<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

impl<B: AclBackend> MakeExecutable for AclGrant<B> {
    fn make_executable(&self, path: &Path) -> Result<Elevation> {
        let attempt = || -> io::Result<()> {
            let principal = self.backend.current_principal()?;
            let mut entries = self.backend.read_acl(path)?;
            entries.push(AclEntry::allow_execute(principal));
            self.backend.write_acl(path, &entries)
        };

        match attempt() {
            Ok(()) => Ok(Elevation::Applied),
            Err(e) if e.kind() == io::ErrorKind::Unsupported => {
                tracing::debug!("ACLs are not supported for {}: {}", path.display(), e);
                Ok(Elevation::Unsupported)
            }
            Err(e) => Err(permission_error(path, &e)),
        }
    }
}

/// Strategy used when no permission model is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPermissionModel;

impl MakeExecutable for NoPermissionModel {
    fn make_executable(&self, path: &Path) -> Result<Elevation> {
        tracing::debug!("No permission model available, leaving {} as extracted", path.display());
        Ok(Elevation::Unsupported)
    }
}

/// Applies the host's "make executable" semantics.
pub struct PermissionElevator {
    model: PermissionModel,
    strategy: Box<dyn MakeExecutable>,
}

impl PermissionElevator {
    /// Pick the strategy matching the permission model of `platform`.
    #[must_use]
    pub fn for_platform(platform: &Platform) -> Self {
        let model = PermissionModel::probe(platform);
        let strategy: Box<dyn MakeExecutable> = match model {
            PermissionModel::Posix => Box::new(PosixBits),
            #[cfg(windows)]
            PermissionModel::Acl => Box::new(AclGrant::new(WindowsAcl)),
            #[cfg(not(windows))]
            PermissionModel::Acl => Box::new(NoPermissionModel),
            PermissionModel::Unavailable => Box::new(NoPermissionModel),
        };
        Self { model, strategy }
    }

    pub fn model(&self) -> PermissionModel {
        self.model
    }

    /// Grant execute permission on `path`.
    pub fn elevate(&self, path: &Path) -> Result<Elevation> {
        let outcome = self.strategy.make_executable(path)?;
        tracing::debug!(
            "Execute permission on {} ({:?} model): {:?}",
            path.display(),
            self.model,
            outcome
        );
        Ok(outcome)
    }
}

fn permission_error(path: &Path, e: &io::Error) -> CoreError {
    CoreError::Permission {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}
