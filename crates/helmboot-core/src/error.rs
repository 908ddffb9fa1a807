//! Core error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unsupported compressor type: {kind}")]
    UnsupportedCompression { kind: String },

    #[error("Unsupported archive type: {kind}")]
    UnsupportedArchive { kind: String },

    #[error("Unrecognized archive format (leading bytes: {leading})")]
    UnrecognizedArchive { leading: String },

    #[error("Unable to find {name} executable in archive")]
    BinaryNotFound { name: String },

    #[error("Archive entry {entry} is empty")]
    EmptyEntry { entry: String },

    #[error("Unable to read archive: {message}")]
    Archive { message: String },

    #[error("Unable to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to set executable permission on {}: {message}", path.display())]
    Permission { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for CoreError {
    fn from(e: zip::result::ZipError) -> Self {
        CoreError::Archive {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
