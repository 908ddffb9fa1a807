//! Platform detection and the executable naming that depends on it.

use std::fmt;

/// Broad operating-system family, used to pick file names and the
/// permission model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsFamily {
    /// Unix-like systems exposing POSIX permission bits.
    Posix,
    /// Windows, where executables carry an `.exe` suffix and files use ACLs.
    Windows,
    /// Anything else; no permission model is assumed.
    Unknown,
}

/// A host platform description.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    /// Operating system family.
    pub family: OsFamily,
    /// Operating system as used in release asset names (darwin, linux, windows).
    pub os: String,
    /// Architecture as used in release asset names (amd64, arm64).
    pub arch: String,
}

impl Platform {
    /// Create a new platform.
    #[must_use]
    pub fn new(family: OsFamily, os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            family,
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Detect the platform this process runs on.
    #[must_use]
    pub fn current() -> Self {
        let family = if cfg!(windows) {
            OsFamily::Windows
        } else if cfg!(unix) {
            OsFamily::Posix
        } else {
            OsFamily::Unknown
        };
        let os = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            other => other,
        };
        Self::new(family, os, arch)
    }

    /// Whether this is a Windows platform.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.family == OsFamily::Windows
    }

    /// File name of an executable with the given base name on this platform.
    #[must_use]
    pub fn executable_name(&self, base: &str) -> String {
        if self.is_windows() {
            format!("{}.exe", base)
        } else {
            base.to_string()
        }
    }

    /// Archive extension helm release assets use on this platform.
    #[must_use]
    pub fn archive_extension(&self) -> &'static str {
        if self.is_windows() { "zip" } else { "tar.gz" }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// The executable to look for inside an archive and on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    base_name: String,
    file_name: String,
}

impl TargetDescriptor {
    /// Describe the executable `base_name` as named on `platform`.
    #[must_use]
    pub fn new(base_name: impl Into<String>, platform: &Platform) -> Self {
        let base_name = base_name.into();
        let file_name = platform.executable_name(&base_name);
        Self {
            base_name,
            file_name,
        }
    }

    /// The helm executable for `platform`.
    #[must_use]
    pub fn helm(platform: &Platform) -> Self {
        Self::new("helm", platform)
    }

    /// Base name without any platform suffix.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Platform-specific file name (`helm` or `helm.exe`).
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Whether an archive entry path names this executable.
    ///
    /// Archive layouts vary by publisher, so only the final path component
    /// is compared. Both `/` and `\` are accepted as separators.
    #[must_use]
    pub fn matches_entry(&self, entry_path: &str) -> bool {
        let trimmed = entry_path.trim_end_matches(['/', '\\']);
        let last = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
        last == self.file_name
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name)
    }
}
