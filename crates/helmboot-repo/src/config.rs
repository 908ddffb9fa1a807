//! Provisioning settings
//!
//! Loaded from a `helmboot.yaml` file; every field has a default so an empty
//! or missing file yields a usable configuration.

use helmboot_core::Platform;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{RepoError, Result};

/// Default settings file name, looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "helmboot.yaml";

/// Helm release downloaded when no URL is configured
pub const DEFAULT_HELM_VERSION: &str = "2.17.0";

/// Provisioning settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Directory the helm executable is installed into
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,

    /// Directory created for build output
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Archive to download; derived from `helm_version` when unset
    #[serde(default)]
    pub download_url: Option<String>,

    /// Release used for the derived download URL
    #[serde(default = "default_helm_version")]
    pub helm_version: String,

    /// Alternate helm home directory (`--home`)
    #[serde(default)]
    pub home_dir: Option<PathBuf>,

    /// Pass `--skip-refresh` to `helm init`
    #[serde(default)]
    pub skip_refresh: bool,

    /// Skip the whole provisioning step
    #[serde(default)]
    pub skip: bool,

    /// Skip initialization only (same effect as `skip`)
    #[serde(default)]
    pub skip_init: bool,

    /// Use a helm already on this machine instead of downloading one
    #[serde(default)]
    pub use_local_binary: bool,

    /// Explicit local helm; looked up on `PATH` when unset
    #[serde(default)]
    pub local_binary: Option<PathBuf>,

    /// Repositories registered after initialization, in order
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

fn default_install_dir() -> PathBuf {
    PathBuf::from("target").join("helm")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("target").join("helm").join("repo")
}

fn default_helm_version() -> String {
    DEFAULT_HELM_VERSION.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            install_dir: default_install_dir(),
            output_dir: default_output_dir(),
            download_url: None,
            helm_version: default_helm_version(),
            home_dir: None,
            skip_refresh: false,
            skip: false,
            skip_init: false,
            use_local_binary: false,
            local_binary: None,
            repositories: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RepoError::ConfigFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content).map_err(|e| RepoError::ConfigFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load settings from `path` if it exists, otherwise use defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse settings from YAML
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check repository definitions
    pub fn validate(&self) -> Result<()> {
        for (i, repo) in self.repositories.iter().enumerate() {
            repo.validate()?;
            if self.repositories[..i].iter().any(|r| r.name == repo.name) {
                return Err(RepoError::InvalidConfig {
                    message: format!("Repository '{}' is declared more than once", repo.name),
                });
            }
        }
        Ok(())
    }

    /// Whether provisioning should be bypassed entirely
    pub fn is_skipped(&self) -> bool {
        self.skip || self.skip_init
    }

    /// The archive URL to download on `platform`
    pub fn download_url_for(&self, platform: &Platform) -> String {
        match &self.download_url {
            Some(url) => url.clone(),
            None => default_download_url(&self.helm_version, platform),
        }
    }
}

/// Official helm release archive URL for `version` on `platform`
#[must_use]
pub fn default_download_url(version: &str, platform: &Platform) -> String {
    format!(
        "https://get.helm.sh/helm-v{}-{}-{}.{}",
        version.trim_start_matches('v'),
        platform.os,
        platform.arch,
        platform.archive_extension()
    )
}

/// A chart repository to register with helm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// Name passed to `helm repo add`
    pub name: String,

    /// Repository URL
    pub url: String,

    /// Credential store key; defaults to the repository name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_ref: Option<String>,
}

impl Repository {
    /// Create a repository definition
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        let repo = Self {
            name: name.into(),
            url: url.into(),
            credential_ref: None,
        };
        repo.validate()?;
        Ok(repo)
    }

    /// Use a different credential store key
    #[must_use]
    pub fn with_credential_ref(mut self, key: impl Into<String>) -> Self {
        self.credential_ref = Some(key.into());
        self
    }

    /// Key used to look up credentials for this repository
    pub fn credential_key(&self) -> &str {
        self.credential_ref.as_deref().unwrap_or(&self.name)
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(RepoError::InvalidConfig {
                message: format!("Repository with URL {} has no name", self.url),
            });
        }
        if self.name.starts_with('-') || self.name.chars().any(char::is_whitespace) {
            return Err(RepoError::InvalidConfig {
                message: format!("Invalid repository name '{}'", self.name),
            });
        }
        let parsed = Url::parse(&self.url).map_err(|e| RepoError::InvalidRepositoryUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" | "file" => Ok(()),
            other => Err(RepoError::InvalidRepositoryUrl {
                url: self.url.clone(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}
