//! Content Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A content error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for content operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The file could not be read far enough to sniff its content type.
    #[display("could not classify {}", _0.display())]
    Classification(#[error(not(source))] PathBuf),
    /// The directory holding the files could not be listed.
    #[display("could not scan {}", _0.display())]
    Scan(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::Classification(_) | ErrorKind::Scan(_) => true,
        }
    }
}
