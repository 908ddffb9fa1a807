//! helmboot Repository Support
//!
//! Everything that describes *where* helm comes from and *what* it is set
//! up with:
//!
//! - **Settings**: `helmboot.yaml` with install paths, download URL and skip flags
//! - **Repositories**: chart repositories registered after initialization
//! - **Credentials**: per-user store resolved by repository name
//! - **Sources**: HTTP(S) and local archive streams
//!
//! ## Example
//!
//! ```rust,no_run
//! use helmboot_core::Platform;
//! use helmboot_repo::{Settings, source_for};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load_or_default("helmboot.yaml".as_ref())?;
//! let url = settings.download_url_for(&Platform::current());
//! let stream = source_for(&url)?.open()?;
//! # drop(stream);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod source;

pub use config::{
    DEFAULT_HELM_VERSION, DEFAULT_SETTINGS_FILE, Repository, Settings, default_download_url,
};
pub use credentials::{CredentialStore, Credentials, ResolvedCredentials};
pub use error::{RepoError, Result};
pub use source::{ArchiveSource, FileSource, HttpSource, source_for, transfer_failure};
