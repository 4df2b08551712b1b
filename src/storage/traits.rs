//! Storage traits and error types
//!
//! This module defines the trait interface for the raw content sink and the
//! error type shared by every storage backend.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot store content for URL {0}")]
    InvalidUrl(String),

    #[error("Corrupt checkpoint {path}: {reason}")]
    CorruptCheckpoint { path: PathBuf, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Wraps an IO error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Sink that persists the raw bytes of fetched pages
///
/// Implementations must be safe to share between fetch workers.
pub trait ContentSink: Send + Sync {
    /// Stores `body` under a location derived from `url`
    fn store(&self, url: &str, body: &[u8]) -> StorageResult<()>;
}
