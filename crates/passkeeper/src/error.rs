//! Passkeeper errors

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong in the credential store
#[derive(Error, Debug)]
pub enum Error {
    #[error("Key file not found: {}", .0.display())]
    KeyNotFound(PathBuf),

    #[error("Key file {} is corrupt: expected {expected} bytes, found {actual}", .path.display())]
    KeyCorrupt {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Storage unavailable at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Key '{name}' not found in service '{service}'")]
    ValueNotFound { service: String, name: String },

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Invalid key name: {0}")]
    InvalidName(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid service name: {0}")]
    InvalidService(String),

    #[error("Empty value not allowed")]
    EmptyValue,

    #[error("Failed to transcode '{name}': {source}")]
    Transcode {
        name: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach a path to an I/O failure
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
