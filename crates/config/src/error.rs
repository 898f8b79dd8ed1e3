//! Configuration Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The configuration file does not exist or has an extension no provider
    /// understands.
    #[display("unreadable configuration file {}", _0.display())]
    File(#[error(not(source))] PathBuf),
    /// The merged sources could not be deserialized.
    #[display("could not load configuration")]
    Load,
    /// A value is present but unusable.
    #[display("invalid configuration value for '{_0}'")]
    Invalid(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
