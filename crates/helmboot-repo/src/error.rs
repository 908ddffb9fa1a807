//! Error types for settings, credentials and archive sources

use thiserror::Error;

/// Repository and download errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Configuration Errors ============
    #[error("Invalid repository URL: {url} - {reason}")]
    InvalidRepositoryUrl { url: String, reason: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Unable to read configuration file {path}: {message}")]
    ConfigFile { path: String, message: String },

    // ============ Network Errors ============
    #[error("HTTP error: {status} - request to {url} failed")]
    HttpError { status: u16, url: String },

    #[error("Network error fetching {url}: {message}")]
    NetworkError { url: String, message: String },

    #[error("Invalid download location: {location} - {reason}")]
    InvalidSource { location: String, reason: String },

    #[error("Unable to open local archive {path}: {source}")]
    LocalArchive {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ============ Authentication Errors ============
    #[error("Unable to resolve credentials for repository {name}: {message}")]
    AuthFailed { name: String, message: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for repository operations
pub type Result<T> = std::result::Result<T, RepoError>;

impl From<serde_yaml::Error> for RepoError {
    fn from(e: serde_yaml::Error) -> Self {
        RepoError::Serialization(e.to_string())
    }
}
