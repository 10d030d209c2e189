//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::{Path, PathBuf};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File or directory does not exist
    #[display("not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Entry already exists (for operations that require new entries)
    #[display("already exists: {}", _0.display())]
    AlreadyExists(#[error(not(source))] PathBuf),
    /// Path contains invalid characters, is malformed, or escapes root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Underlying I/O error (permissions, disk full, ...)
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Text encoding label that isn't recognised
    #[display("unsupported encoding: {_0}")]
    UnsupportedEncoding(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Map an I/O error for `path` onto the actionable categories.
    ///
    /// Permission failures stay as [`Io`](Self::Io): there is nothing more
    /// specific the caller can do about them than about any other OS error.
    pub fn from_io(err: IoError, path: &Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::AlreadyExists => Self::AlreadyExists(path.to_path_buf()),
            _ => Self::Io(err),
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
