//! Integrity Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An integrity error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for hashing and magic detection.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No file was supplied to read from.
    #[display("no file provided")]
    NoSource,
    /// The file could not be opened or read to the end.
    #[display("could not hash {}", _0.display())]
    Hash(#[error(not(source))] PathBuf),
    /// The detection program is not installed or could not be started.
    #[display("file type detector unavailable: {_0}")]
    MagicUnavailable(#[error(not(source))] String),
    /// The detection program did not finish in time and was killed.
    #[display("file type detection timed out for {}", _0.display())]
    MagicTimeout(#[error(not(source))] PathBuf),
    /// The detection program exited unsuccessfully.
    #[display("file type detection failed for {}", _0.display())]
    MagicFailed(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Hash(_) | ErrorKind::MagicTimeout(_))
    }
}
