use crate::error::{Error, ErrorKind, Result};
use relic_compress::Compression;
use relic_compress::error::ErrorKind as CompressionErrorKind;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::ops::Deref;

/// Single-extension spellings of compressed tarballs.
const TAR_SHORTHANDS: [(&str, &str); 7] = [
    ("tgz", "gz"),
    ("tbz", "bz2"),
    ("tbz2", "bz2"),
    ("txz", "xz"),
    ("tlz4", "lz4"),
    ("tsz", "sz"),
    ("tzst", "zst"),
];

/// Container format of a release archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Codec {
    Zip,
    #[cfg(feature = "rar")]
    Rar,
    /// A tarball, optionally wrapped in a compression stream.
    Tar(Compression),
    /// A single compressed file that is not a tarball (`readme.txt.gz`).
    /// It carries no member table, so it can be extracted but not listed.
    Compressed(Compression),
}
impl Codec {
    /// Selects a codec from the extension of `filename`, case-insensitively.
    ///
    /// # Errors
    /// - [`ErrorKind::UnsupportedFormat`] when no codec recognises the extension.
    /// - [`ErrorKind::DisabledFormat`] when the codec exists but its cargo
    ///   feature is turned off.
    pub fn detect(filename: &str) -> Result<Self> {
        let lower = filename.trim().to_lowercase();
        let (stem, extension) = match lower.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() && !stem.ends_with('/') => (stem, extension),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(filename.to_string())),
        };
        match extension {
            "zip" => return Ok(Codec::Zip),
            #[cfg(feature = "rar")]
            "rar" => return Ok(Codec::Rar),
            #[cfg(not(feature = "rar"))]
            "rar" => exn::bail!(ErrorKind::DisabledFormat(filename.to_string())),
            "tar" => return Ok(Codec::Tar(Compression::None)),
            _ => {},
        }
        if let Some((_, compression)) = TAR_SHORTHANDS.iter().find(|(shorthand, _)| *shorthand == extension) {
            return Ok(Codec::Tar(parse_compression(compression, filename)?));
        }
        let compression = parse_compression(extension, filename)?;
        if compression == Compression::None {
            exn::bail!(ErrorKind::UnsupportedFormat(filename.to_string()));
        }
        match stem.ends_with(".tar") {
            true => Ok(Codec::Tar(compression)),
            false => Ok(Codec::Compressed(compression)),
        }
    }

    /// Whether [`Archive::list`](crate::Archive::list) is available.
    pub fn can_list(&self) -> bool {
        !matches!(self, Codec::Compressed(_))
    }
}
impl Display for Codec {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Codec::Zip => write!(f, "zip"),
            #[cfg(feature = "rar")]
            Codec::Rar => write!(f, "rar"),
            Codec::Tar(Compression::None) => write!(f, "tar"),
            Codec::Tar(compression) => write!(f, "tar+{compression}"),
            Codec::Compressed(compression) => write!(f, "{compression}"),
        }
    }
}

fn parse_compression(extension: &str, filename: &str) -> Result<Compression> {
    extension.parse::<Compression>().map_err(|err| -> Error {
        let kind = match err.deref() {
            CompressionErrorKind::DisabledFormat(_) => ErrorKind::DisabledFormat(filename.to_string()),
            _ => ErrorKind::UnsupportedFormat(filename.to_string()),
        };
        err.raise(kind)
    })
}
