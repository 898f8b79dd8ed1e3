//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Every variant names the archive,
//! release key or path that triggered it, so a failed batch can be traced
//! back to its cause.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A blank source path or archive filename was supplied.
    #[display("no archive source provided")]
    NoSource,
    /// A value that should be a UUID is not one.
    #[display("invalid identifier: {_0}")]
    InvalidIdentifier(#[error(not(source))] String),
    /// A release was grouped without any files, which only a grouping defect
    /// can produce.
    #[display("release '{_0}' has no files")]
    EmptyRelease(#[error(not(source))] String),
    /// The archive could not be listed or extracted.
    #[display("could not unpack archive {}", _0.display())]
    Archive(#[error(not(source))] PathBuf),
    /// Walking the extracted members failed.
    #[display("could not group releases of {}", _0.display())]
    Walk(#[error(not(source))] PathBuf),
    /// The release could not be repackaged.
    #[display("could not pack release '{_0}'")]
    Pack(#[error(not(source))] String),
    /// The release's record could not be assembled.
    #[display("could not build record for release '{_0}'")]
    Record(#[error(not(source))] String),
    /// Preparing a working or output directory failed.
    #[display("I/O error at {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::EmptyRelease("demo".into()).to_string(), "release 'demo' has no files");
        assert_eq!(ErrorKind::InvalidIdentifier("nope".into()).to_string(), "invalid identifier: nope");
        assert!(!ErrorKind::Pack("demo".into()).is_retryable());
    }
}
