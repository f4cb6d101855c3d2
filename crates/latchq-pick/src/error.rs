//! Error types for pick operations.

use std::path::Path;

/// Errors raised while listing a directory or resolving an index.
#[derive(Debug, thiserror::Error)]
pub enum PickError {
    /// The root path is missing or not a directory.
    #[error("invalid root '{0}': not an existing directory")]
    InvalidRoot(String),

    /// An include/exclude pattern failed to compile.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The filtered, sorted listing is empty.
    #[error("no matching entries under '{root}'")]
    NoMatches { root: String },

    /// The index misses the listing under the `error` policy.
    #[error("index {index} out of range for {total} entries")]
    IndexOutOfRange { index: i64, total: usize },

    /// Filesystem failure, annotated with the path involved.
    #[error("{path}: {message}")]
    Io { path: String, message: String },
}

impl PickError {
    pub(crate) fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
