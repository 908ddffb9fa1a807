//! CLI error types with exit code handling
//!
//! Library errors are folded into one diagnostic type whose variant picks
//! the process exit code.

use helmboot_client::ProvisionError;
use helmboot_core::CoreError;
use helmboot_repo::RepoError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Settings, repository definitions or credentials are invalid
    #[error("Configuration error: {message}")]
    #[diagnostic(code(helmboot::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Archive could not be fetched
    #[error("Download failed: {message}")]
    #[diagnostic(
        code(helmboot::cli::download),
        help("Check the download URL or use --download-url with a reachable mirror")
    )]
    Download { message: String },

    /// Archive format or content problem
    #[error("Archive error: {message}")]
    #[diagnostic(code(helmboot::cli::archive))]
    Archive {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(helmboot::cli::io))]
    Io { message: String },

    /// A helm invocation failed
    #[error("{message}")]
    #[diagnostic(code(helmboot::cli::command))]
    Command {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Invalid combination of arguments
    #[error("{message}")]
    #[diagnostic(code(helmboot::cli::usage))]
    Usage { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Download { .. } => exit_codes::DOWNLOAD_ERROR,
            CliError::Archive { .. } => exit_codes::ARCHIVE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Command { .. } => exit_codes::COMMAND_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
        }
    }

    /// Create a configuration error with help text
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        classify_core(&err, err.to_string())
    }
}

fn classify_core(err: &CoreError, message: String) -> CliError {
    match err {
        CoreError::CreateDir { .. }
        | CoreError::Write { .. }
        | CoreError::Permission { .. }
        | CoreError::Io(_) => CliError::Io { message },
        CoreError::BinaryNotFound { .. } | CoreError::EmptyEntry { .. } => CliError::Archive {
            message,
            help: Some("Make sure the download URL points to a helm release archive".into()),
        },
        _ => CliError::Archive {
            message,
            help: Some("Supported archives are tar (plain or compressed) and zip".into()),
        },
    }
}

impl From<RepoError> for CliError {
    fn from(err: RepoError) -> Self {
        let message = err.to_string();
        match err {
            RepoError::HttpError { .. }
            | RepoError::NetworkError { .. }
            | RepoError::LocalArchive { .. } => CliError::Download { message },
            RepoError::Io(_) => CliError::Io { message },
            RepoError::AuthFailed { .. } => CliError::Config {
                message,
                help: Some("Store credentials with `helmboot credentials set <name>`".into()),
            },
            _ => CliError::Config {
                message,
                help: None,
            },
        }
    }
}

impl From<ProvisionError> for CliError {
    fn from(err: ProvisionError) -> Self {
        match err {
            ProvisionError::Core(e) => e.into(),
            ProvisionError::Repo(e) => e.into(),
            ProvisionError::Install { ref source, .. } => classify_core(source, err.to_string()),
            ProvisionError::LocalBinaryNotFound { .. } => CliError::Command {
                message: err.to_string(),
                help: Some("Install helm on PATH or set localBinary in helmboot.yaml".into()),
            },
            _ => CliError::Command {
                message: err.to_string(),
                help: None,
            },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
