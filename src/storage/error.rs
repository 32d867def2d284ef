//! Storage error types.

use thiserror::Error;

/// Errors reported by a [`KeyValueStore`](super::KeyValueStore).
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend cannot be used at all (e.g. no config directory).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The value could not be encoded for storage.
    #[error("failed to serialize value: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Returns true if retrying the operation later may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
