//! Repository credential storage
//!
//! Credentials are kept out of `helmboot.yaml` in a per-user store and
//! looked up by repository name (or the repository's `credentialRef`).
//! Entries either hold a username/password pair or name the environment
//! variables to read them from, which suits CI agents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::Repository;
use crate::error::{RepoError, Result};

/// Credential types supported
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Credentials {
    /// Basic authentication (username/password)
    Basic { username: String, password: String },

    /// Environment variable references
    Env {
        #[serde(rename = "usernameVar")]
        username_var: String,
        #[serde(rename = "passwordVar")]
        password_var: String,
    },
}

impl Credentials {
    /// Create basic auth credentials
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Create environment variable credentials
    pub fn from_env(username_var: impl Into<String>, password_var: impl Into<String>) -> Self {
        Credentials::Env {
            username_var: username_var.into(),
            password_var: password_var.into(),
        }
    }

    /// Resolve credentials to actual values for the repository `name`
    pub fn resolve(&self, name: &str) -> Result<ResolvedCredentials> {
        match self {
            Credentials::Basic { username, password } => Ok(ResolvedCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            Credentials::Env {
                username_var,
                password_var,
            } => {
                let read = |var: &str| {
                    std::env::var(var).map_err(|_| RepoError::AuthFailed {
                        name: name.to_string(),
                        message: format!("Environment variable {} not set", var),
                    })
                };
                Ok(ResolvedCredentials {
                    username: read(username_var)?,
                    password: read(password_var)?,
                })
            }
        }
    }

    /// Short description safe to print
    pub fn describe(&self) -> String {
        match self {
            Credentials::Basic { username, .. } => format!("basic ({})", username),
            Credentials::Env {
                username_var,
                password_var,
            } => format!("env (${}, ${})", username_var, password_var),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Credentials::Env {
                username_var,
                password_var,
            } => f
                .debug_struct("Env")
                .field("username_var", username_var)
                .field("password_var", password_var)
                .finish(),
        }
    }
}

/// Resolved username and password for `helm repo add`
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Credential store - manages credentials keyed by repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialStore {
    /// Credentials by repository name or credential reference
    #[serde(default)]
    credentials: BTreeMap<String, Credentials>,
}

impl CredentialStore {
    /// Load credential store from default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_or_default(&path)
    }

    /// Load from `path`, or an empty store when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load from specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let store: Self = serde_yaml::from_str(&content)?;
        Ok(store)
    }

    /// Save to specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;

        // Owner-only on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut options = std::fs::OpenOptions::new();
            options.write(true).create(true).truncate(true).mode(0o600);
            std::io::Write::write_all(&mut options.open(path)?, content.as_bytes())?;
            Ok(())
        }

        #[cfg(not(unix))]
        {
            std::fs::write(path, content)?;
            Ok(())
        }
    }

    /// Get default credential store path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| RepoError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("helmboot").join("credentials.yaml"))
    }

    /// Store credentials under `key`
    pub fn set(&mut self, key: &str, credentials: Credentials) {
        self.credentials.insert(key.to_string(), credentials);
    }

    /// Get credentials stored under `key`
    pub fn get(&self, key: &str) -> Option<&Credentials> {
        self.credentials.get(key)
    }

    /// Remove credentials stored under `key`
    pub fn remove(&mut self, key: &str) -> Option<Credentials> {
        self.credentials.remove(key)
    }

    /// Check if credentials exist under `key`
    pub fn has(&self, key: &str) -> bool {
        self.credentials.contains_key(key)
    }

    /// Stored entries in key order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Credentials)> {
        self.credentials.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Credentials for `repo`, or `None` when the repository is public
    pub fn resolve_for(&self, repo: &Repository) -> Result<Option<ResolvedCredentials>> {
        match self.get(repo.credential_key()) {
            Some(credentials) => credentials.resolve(&repo.name).map(Some),
            None => {
                if repo.credential_ref.is_some() {
                    return Err(RepoError::AuthFailed {
                        name: repo.name.clone(),
                        message: format!(
                            "no stored credentials named '{}'",
                            repo.credential_key()
                        ),
                    });
                }
                Ok(None)
            }
        }
    }
}
