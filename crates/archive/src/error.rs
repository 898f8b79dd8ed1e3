//! Archive Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A blank source path or archive filename was supplied.
    #[display("no archive source provided")]
    NoSource,
    /// No codec recognises the declared filename.
    #[display("unsupported archive format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The codec exists but was compiled out (cargo feature disabled).
    #[display("disabled archive format: {_0}")]
    DisabledFormat(#[error(not(source))] String),
    /// The codec has no member table to list.
    #[display("{_0} streams cannot be listed")]
    NotListable(#[error(not(source))] String),
    /// The codec can list members but cannot write them out.
    #[display("{_0} archives cannot be extracted")]
    NotExtractable(#[error(not(source))] String),
    /// The archive could not be opened or its structure could not be read.
    #[display("unreadable archive: {}", _0.display())]
    Corrupt(#[error(not(source))] PathBuf),
    /// A member is damaged, or its name escapes the destination directory.
    #[display("invalid archive member: {_0}")]
    InvalidEntry(#[error(not(source))] String),
    /// A destination entry exists and overwriting is disabled.
    #[display("destination already exists: {}", _0.display())]
    AlreadyExists(#[error(not(source))] PathBuf),
    /// Writing to the destination failed.
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
        assert_eq!(ErrorKind::UnsupportedFormat("demo.7z".into()).to_string(), "unsupported archive format: demo.7z");
        assert_eq!(ErrorKind::NotListable("gzip".into()).to_string(), "gzip streams cannot be listed");
        assert_eq!(ErrorKind::Corrupt(PathBuf::from("/tmp/a.zip")).to_string(), "unreadable archive: /tmp/a.zip");
    }

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Io(PathBuf::from("/tmp")).is_retryable());
        assert!(!ErrorKind::InvalidEntry("../x".into()).is_retryable());
        assert!(!ErrorKind::NoSource.is_retryable());
    }
}
