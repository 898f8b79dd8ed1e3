//! Hashing and file-type detection used to content-address packed releases.
//!
//! Two digests are kept per artifact: a fast CRC-32 ("weak") for legacy
//! cross-checks and BLAKE3 ("strong") for deduplication. The file type comes
//! from an external `file`-style program, run with a bounded timeout.

pub mod error;
mod hash;
mod magic;

pub use crate::hash::{strong_hash, strong_hash_reader, weak_hash, weak_hash_reader};
pub use crate::magic::{DEFAULT_PROGRAM, DEFAULT_TIMEOUT, MagicCommand, magic_type, normalize_magic};
use crate::error::Result;
use std::path::Path;
use tracing::instrument;

/// Everything known about one artifact's bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub weak: String,
    pub strong: String,
    /// `None` when detection was not requested.
    pub magic: Option<String>,
}

/// Hashes `path` and, when `magic` is given, identifies its type.
#[instrument(skip(path, magic), fields(path = %path.as_ref().display()))]
pub fn fingerprint(path: impl AsRef<Path>, magic: Option<&MagicCommand>) -> Result<Fingerprint> {
    let path = path.as_ref();
    let strong = strong_hash(path)?;
    let weak = weak_hash(path)?;
    let magic = match magic {
        Some(command) => Some(command.magic_type(path)?),
        None => None,
    };
    Ok(Fingerprint { weak, strong, magic })
}
