use crate::Compression;
use crate::error::{Error, ErrorKind};
use std::str::FromStr;

impl FromStr for Compression {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Compression::None),
            "bz2" | "bzip2" => Ok(Compression::Bzip2),
            "gz" | "gzip" => Ok(Compression::Gzip),
            #[cfg(feature = "lz4")]
            "lz4" => Ok(Compression::Lz4),
            #[cfg(not(feature = "lz4"))]
            "lz4" => exn::bail!(ErrorKind::DisabledFormat(s.to_string())),
            #[cfg(feature = "snappy")]
            "sz" | "snappy" => Ok(Compression::Snappy),
            #[cfg(not(feature = "snappy"))]
            "sz" | "snappy" => exn::bail!(ErrorKind::DisabledFormat(s.to_string())),
            #[cfg(feature = "xz")]
            "xz" | "lzma" => Ok(Compression::Xz),
            #[cfg(not(feature = "xz"))]
            "xz" | "lzma" => exn::bail!(ErrorKind::DisabledFormat(s.to_string())),
            #[cfg(feature = "zstd")]
            "zst" | "zstd" => Ok(Compression::Zstd),
            #[cfg(not(feature = "zstd"))]
            "zst" | "zstd" => exn::bail!(ErrorKind::DisabledFormat(s.to_string())),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Compression;
    use rstest::rstest;

    #[rstest]
    #[case("none", Compression::None)]
    #[case("bz2", Compression::Bzip2)]
    #[case("bzip2", Compression::Bzip2)]
    #[case("BZIP2", Compression::Bzip2)]
    #[case("gz", Compression::Gzip)]
    #[case("GZIP", Compression::Gzip)]
    #[cfg_attr(feature = "lz4", case("lz4", Compression::Lz4))]
    #[cfg_attr(feature = "snappy", case("sz", Compression::Snappy))]
    #[cfg_attr(feature = "snappy", case("snappy", Compression::Snappy))]
    #[cfg_attr(feature = "xz", case("xz", Compression::Xz))]
    #[cfg_attr(feature = "xz", case("lzma", Compression::Xz))]
    #[cfg_attr(feature = "zstd", case("zst", Compression::Zstd))]
    fn test_from_str(#[case] test: &str, #[case] expected: Compression) {
        assert_eq!(test.parse::<Compression>().unwrap(), expected);
    }

    #[rstest]
    #[case("invalid")]
    #[case("lzip")]
    #[case(" ")]
    fn test_from_str_invalid(#[case] test: &str) {
        assert!(test.parse::<Compression>().is_err());
    }
}
