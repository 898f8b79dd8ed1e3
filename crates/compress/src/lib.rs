//! Stream compression with extension-based format detection.
//!
//! This crate wraps several compression libraries behind a unified
//! [`Compression`] enum, providing:
//!
//! - **Format detection** from extensions or names
//!   ([`FromStr`](std::str::FromStr))
//! - **In-memory** compression/decompression ([`Compression::compress`],
//!   [`Compression::decompress`])
//! - **Streaming** via wrapped readers/writers ([`Compression::wrap_reader`],
//!   [`Compression::wrap_writer`])
//!
//! These are the outer layers of compressed tarballs (`.tar.gz`, `.tar.lz4`
//! and friends). Bzip2 and Gzip are always available. LZ4, Snappy and XZ are
//! default features; Zstd is opt-in.

mod construct;
pub mod error;
mod ops;
mod util;

/// A supported compression format.
///
/// Variants gated behind feature flags (`lz4`, `snappy`, `xz`, `zstd`) are
/// only available when the corresponding feature is enabled. Defaults to
/// [`None`](Self::None) (uncompressed).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Uncompressed
    #[default]
    None,
    /// Bzip2 compression (.bz2)
    Bzip2,
    /// Gzip compression (.gz)
    Gzip,
    /// LZ4 frame compression (.lz4)
    #[cfg(feature = "lz4")]
    Lz4,
    /// Framed Snappy compression (.sz)
    #[cfg(feature = "snappy")]
    Snappy,
    /// XZ/LZMA compression (.xz)
    #[cfg(feature = "xz")]
    Xz,
    /// Zstd compression (.zst)
    #[cfg(feature = "zstd")]
    Zstd,
}

#[cfg(test)]
mod tests {
    use crate::Compression;

    #[test]
    fn compression_default() {
        assert_eq!(Compression::default(), Compression::None);
    }
}
