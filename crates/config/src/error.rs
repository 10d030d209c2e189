//! Config Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A config error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An explicitly requested config file does not exist.
    #[display("config file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The layered sources could not be merged or deserialized.
    #[display("could not load configuration")]
    Load,
    /// A value deserialized fine but is not usable.
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
    /// The configured root could not be opened by the manager.
    #[display("could not open the configured root")]
    Open,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            _ => false,
        }
    }
}
