//! Listing and extraction of release archives, independent of container type.
//!
//! The container format is chosen purely from the archive's *declared*
//! filename ([`Codec::detect`]), never from the path it is stored under, so a
//! source kept under an opaque content-addressed name can still be opened by
//! passing its original filename alongside it.
//!
//! Every codec behaves the same way:
//!
//! - destination entries are overwritten and missing directories created
//!   (see [`Options`]),
//! - the first corrupt or unsafe member aborts the whole operation; partial
//!   listings are never returned,
//! - members are reported exactly as stored, without an implicit wrapper
//!   folder, using forward slashes,
//! - legacy member names that are not UTF-8 are decoded from code page 437.

mod codec;
mod dostime;
pub mod error;
mod path;
#[cfg(feature = "rar")]
mod rar;
mod single;
mod tar;
mod zip;

pub use crate::codec::Codec;
pub use crate::zip::ZipBuilder;
use crate::error::{ErrorKind, Result};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::instrument;

/// A single entry reported by [`Archive::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Relative path inside the archive, `/`-separated, without leading `./`.
    pub name: String,
    /// Uncompressed size in bytes (zero for directories).
    pub size: u64,
    /// Modification time recorded by the archive, if any.
    pub modified: Option<OffsetDateTime>,
    pub is_dir: bool,
}
impl Member {
    /// Final path segment of the member name.
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Parent directory of the member, or an empty string for root members.
    pub fn parent(&self) -> &str {
        self.name.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
    }
}

/// Behaviour shared by every codec when writing to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Replace files that already exist in the destination.
    pub overwrite: bool,
    /// Create the destination directory and any missing parents.
    pub create_dirs: bool,
}
impl Default for Options {
    fn default() -> Self {
        Self { overwrite: true, create_dirs: true }
    }
}

/// An archive on disk paired with the codec its declared filename implies.
///
/// Nothing is held open between calls: every [`list`](Self::list) and
/// [`extract`](Self::extract) reopens the source.
#[derive(Debug, Clone)]
pub struct Archive {
    source: PathBuf,
    filename: String,
    codec: Codec,
    options: Options,
}
impl Archive {
    /// Pairs `source` with the codec detected from `filename`.
    ///
    /// # Errors
    /// [`ErrorKind::NoSource`] for a blank path or filename, otherwise the
    /// detection errors of [`Codec::detect`]. No I/O is performed.
    pub fn open(source: impl Into<PathBuf>, filename: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let filename = filename.into();
        if source.as_os_str().is_empty() || filename.trim().is_empty() {
            exn::bail!(ErrorKind::NoSource);
        }
        let codec = Codec::detect(&filename)?;
        Ok(Self { source, filename, codec, options: Options::default() })
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Lists every member of the archive in stored order.
    #[instrument(skip(self), fields(source = %self.source.display(), codec = %self.codec, members))]
    pub fn list(&self) -> Result<Vec<Member>> {
        let members = match self.codec {
            Codec::Zip => zip::list(&self.source)?,
            Codec::Tar(compression) => tar::list(&self.source, compression)?,
            #[cfg(feature = "rar")]
            Codec::Rar => rar::list(&self.source)?,
            Codec::Compressed(_) => exn::bail!(ErrorKind::NotListable(self.codec.to_string())),
        };
        tracing::Span::current().record("members", members.len());
        Ok(members)
    }

    /// Member names only, in stored order.
    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self.list()?.into_iter().map(|member| member.name).collect())
    }

    /// Extracts every member below `destination`, restoring recorded
    /// modification times.
    #[instrument(skip(self, destination), fields(source = %self.source.display(), codec = %self.codec, destination = %destination.as_ref().display()))]
    pub fn extract(&self, destination: impl AsRef<Path>) -> Result<()> {
        let destination = destination.as_ref();
        path::prepare_destination(destination, &self.options)?;
        match self.codec {
            Codec::Zip => zip::extract(&self.source, destination, &self.options),
            Codec::Tar(compression) => tar::extract(&self.source, compression, destination, &self.options),
            #[cfg(feature = "rar")]
            Codec::Rar => rar::extract(&self.source, destination, &self.options),
            Codec::Compressed(compression) => {
                single::extract(&self.source, &self.filename, compression, destination, &self.options)
            },
        }
    }
}

/// Lists the members of `source`, whose format is implied by `filename`.
pub fn list(source: impl AsRef<Path>, filename: &str) -> Result<Vec<Member>> {
    Archive::open(source.as_ref(), filename)?.list()
}

/// Extracts `source`, whose format is implied by `filename`, into `destination`.
pub fn extract(source: impl AsRef<Path>, filename: &str, destination: impl AsRef<Path>) -> Result<()> {
    Archive::open(source.as_ref(), filename)?.extract(destination)
}
