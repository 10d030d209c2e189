//! Manager Error Types
//!
//! Every failure from [`dirman_storage`] is re-raised under one of these
//! kinds, so callers only ever match on a single enum while the storage
//! error stays attached as a child frame of the [`exn::Exn`] tree.

use derive_more::{Display, Error};
use dirman_storage::error::{Error as StorageError, ErrorKind as StorageErrorKind};
use std::path::PathBuf;

/// A manager error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for manager operations.
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong, from the caller's point of view.
///
/// ### Caller Errors
/// - [`ErrorKind::InvalidPath`]
/// - [`ErrorKind::NotFound`]
/// - [`ErrorKind::AlreadyExists`]
///
/// ### Environment Errors
/// - [`ErrorKind::Io`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The root is unusable, or a sub-path or name is malformed or escapes it.
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Nothing in the cache (or on disk) matched. Holds a description of
    /// what was looked for.
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// A mutation would have replaced an existing entry.
    #[display("already exists: {}", _0.display())]
    AlreadyExists(#[error(not(source))] PathBuf),
    /// The operating system refused; the storage frame below says why.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Re-raise a storage error under the matching manager kind.
    #[track_caller]
    pub fn storage(err: StorageError) -> Error {
        let kind = match &*err {
            StorageErrorKind::NotFound(path) => Self::NotFound(path.display().to_string()),
            StorageErrorKind::AlreadyExists(path) => Self::AlreadyExists(path.clone()),
            StorageErrorKind::InvalidPath(path) => Self::InvalidPath(path.clone()),
            StorageErrorKind::Io(_) | StorageErrorKind::UnsupportedEncoding(_) => Self::Io,
        };
        err.raise(kind)
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_storage_kinds_are_carried_over() {
        let err = ErrorKind::storage(StorageErrorKind::AlreadyExists(PathBuf::from("/tmp/a")).into());
        assert!(matches!(&*err, ErrorKind::AlreadyExists(p) if p == Path::new("/tmp/a")));
        let err = ErrorKind::storage(StorageErrorKind::NotFound(PathBuf::from("/tmp/b")).into());
        assert!(matches!(&*err, ErrorKind::NotFound(s) if s == "/tmp/b"));
        let err = ErrorKind::storage(StorageErrorKind::Io(std::io::Error::other("disk on fire")).into());
        assert!(matches!(&*err, ErrorKind::Io));
        assert!(err.is_retryable());
    }
}
