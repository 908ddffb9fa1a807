//! Provisioning error types

use std::path::PathBuf;

use helmboot_core::CoreError;
use helmboot_repo::RepoError;
use thiserror::Error;

/// Errors from the provisioning flow and helm invocations
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("Unable to install helm from {location}: {source}")]
    Install {
        location: String,
        #[source]
        source: CoreError,
    },

    #[error("Unable to run {program} to {action}: {source}")]
    Spawn {
        program: PathBuf,
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error initializing helm client ({status}){}", stderr_suffix(.stderr))]
    InitFailed { status: String, stderr: String },

    #[error("Error adding repository {name} ({status}){}", stderr_suffix(.stderr))]
    RepoAddFailed {
        name: String,
        status: String,
        stderr: String,
    },

    #[error("Unable to verify local helm binary {path} ({status}){}", stderr_suffix(.stderr))]
    VerifyFailed {
        path: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("Unable to find local helm executable {name} on PATH")]
    LocalBinaryNotFound { name: String },
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

/// Result type for provisioning operations
pub type Result<T> = std::result::Result<T, ProvisionError>;
