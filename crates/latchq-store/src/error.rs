//! Error types for queue-store operations.

use std::path::Path;

/// Errors raised by the memory and disk queue backends.
///
/// Every failure aborts the current operation; nothing retries internally.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The queue holds zero items.
    #[error("queue '{queue}' is empty")]
    EmptyQueue { queue: String },

    /// The queue holds items, but the effective read position is at or past
    /// the end.
    #[error("queue '{queue}' has no unread items (cursor {cursor} of {total})")]
    NoUnreadItems {
        queue: String,
        cursor: usize,
        total: usize,
    },

    /// Filesystem failure, annotated with the path involved.
    #[error("{path}: {message}")]
    Io { path: String, message: String },

    /// Payload serialization failure.
    #[error("serialization error: {0}")]
    Serialize(String),

    /// A stored item file could not be decoded.
    #[error("{path}: parse error: {message}")]
    Parse { path: String, message: String },

    /// The cursor file holds bytes that are not valid UTF-8.
    #[error("corrupted cursor file {path}: {message}")]
    Corrupt { path: String, message: String },
}

impl StoreError {
    pub(crate) fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn parse(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
