//! Compression Operations

use crate::Compression;
use crate::error::{ErrorKind, Result};
use bzip2::{Compression as BzCompression, read::MultiBzDecoder, write::BzEncoder};
use exn::ResultExt;
use flate2::{Compression as GzCompression, read::MultiGzDecoder, write::GzEncoder};
#[cfg(feature = "lz4")]
use lz4_flex::frame::{FrameDecoder as Lz4Decoder, FrameEncoder as Lz4Encoder};
#[cfg(feature = "snappy")]
use snap::{read::FrameDecoder as SnappyDecoder, write::FrameEncoder as SnappyEncoder};
use std::io::{Read, Write};
use tracing::instrument;
#[cfg(feature = "xz")]
use xz2::{read::XzDecoder, write::XzEncoder};
#[cfg(feature = "zstd")]
use zstd::stream::{read::Decoder as ZstdDecoder, write::Encoder as ZstdEncoder};

// Release packs are written once and read many times, so the slower and
// tighter levels are preferred wherever a format has levels at all.
const BZIP2_LEVEL: BzCompression = BzCompression::best();
const GZIP_LEVEL: GzCompression = GzCompression::best();
#[cfg(feature = "xz")]
const XZ_LEVEL: u32 = 9;
#[cfg(feature = "zstd")]
const ZSTD_LEVEL: i32 = 19;

impl Compression {
    /// Compress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use relic_compress::Compression;
    ///
    /// let data = b"Hello, world!";
    /// let compressed = Compression::Bzip2.compress(data).unwrap();
    /// assert_ne!(compressed, data);
    /// ```
    #[instrument(skip(input), fields(format = %self, input_size = input.len(), output_size))]
    pub fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        {
            // Encoders finish their stream when dropped.
            let mut writer = self.wrap_writer(&mut output)?;
            writer.write_all(input).or_raise(|| ErrorKind::Io)?;
            writer.flush().or_raise(|| ErrorKind::Io)?;
        }
        tracing::Span::current().record("output_size", output.len());
        Ok(output)
    }

    /// Decompress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use relic_compress::Compression;
    ///
    /// let original = b"Hello, world!";
    /// let compressed = Compression::Gzip.compress(original).unwrap();
    /// let decompressed = Compression::Gzip.decompress(&compressed).unwrap();
    /// assert_eq!(decompressed, original);
    /// ```
    #[instrument(skip(input), fields(format = %self, input_size = input.len(), output_size))]
    pub fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut reader = self.wrap_reader(input)?;
        reader.read_to_end(&mut output).or_raise(|| ErrorKind::InvalidData)?;
        tracing::Span::current().record("output_size", output.len());
        Ok(output)
    }

    /// Wrap a reader with the appropriate decompression layer.
    ///
    /// Returns a boxed reader that automatically decompresses data.
    pub fn wrap_reader<'a, R: Read + 'a>(&self, reader: R) -> Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => Box::new(reader),
            Compression::Bzip2 => Box::new(MultiBzDecoder::new(reader)),
            Compression::Gzip => Box::new(MultiGzDecoder::new(reader)),
            #[cfg(feature = "lz4")]
            Compression::Lz4 => Box::new(Lz4Decoder::new(reader)),
            #[cfg(feature = "snappy")]
            Compression::Snappy => Box::new(SnappyDecoder::new(reader)),
            #[cfg(feature = "xz")]
            Compression::Xz => Box::new(XzDecoder::new(reader)),
            #[cfg(feature = "zstd")]
            Compression::Zstd => Box::new(ZstdDecoder::new(reader).or_raise(|| ErrorKind::Encoder)?),
        })
    }

    /// Wrap a writer with the appropriate compression layer.
    ///
    /// Returns a boxed writer that automatically compresses data. The
    /// compressed stream is finalized when the writer is dropped.
    pub fn wrap_writer<'a, W: Write + 'a>(&self, writer: W) -> Result<Box<dyn Write + 'a>> {
        Ok(match self {
            Compression::None => Box::new(writer),
            Compression::Bzip2 => Box::new(BzEncoder::new(writer, BZIP2_LEVEL)),
            Compression::Gzip => Box::new(GzEncoder::new(writer, GZIP_LEVEL)),
            #[cfg(feature = "lz4")]
            Compression::Lz4 => Box::new(Lz4Encoder::new(writer).auto_finish()),
            #[cfg(feature = "snappy")]
            Compression::Snappy => Box::new(SnappyEncoder::new(writer)),
            #[cfg(feature = "xz")]
            Compression::Xz => Box::new(XzEncoder::new(writer, XZ_LEVEL)),
            #[cfg(feature = "zstd")]
            Compression::Zstd => {
                Box::new(ZstdEncoder::new(writer, ZSTD_LEVEL).or_raise(|| ErrorKind::Encoder)?.auto_finish())
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Compression;
    use rstest::rstest;
    use std::io::{Cursor, Read};

    #[rstest]
    #[case(Compression::None)]
    #[case(Compression::Bzip2)]
    #[case(Compression::Gzip)]
    #[cfg_attr(feature = "lz4", case(Compression::Lz4))]
    #[cfg_attr(feature = "snappy", case(Compression::Snappy))]
    #[cfg_attr(feature = "xz", case(Compression::Xz))]
    #[cfg_attr(feature = "zstd", case(Compression::Zstd))]
    fn test_compress_decompress(#[case] format: Compression) {
        let original = b"Hello, world! This is a test of some compression.";
        let compressed = format.compress(original).unwrap();
        let decompressed = format.decompress(&compressed).unwrap();
        assert_eq!(decompressed, original);
    }

    #[rstest]
    #[case(Compression::Bzip2)]
    #[case(Compression::Gzip)]
    #[cfg_attr(feature = "lz4", case(Compression::Lz4))]
    #[cfg_attr(feature = "snappy", case(Compression::Snappy))]
    #[cfg_attr(feature = "xz", case(Compression::Xz))]
    fn test_invalid_compressed_data(#[case] format: Compression) {
        let invalid_data = b"This is not compressed data";
        assert!(format.decompress(invalid_data).is_err());
    }

    #[rstest]
    #[case(Compression::Gzip)]
    #[case(Compression::Bzip2)]
    #[cfg_attr(feature = "lz4", case(Compression::Lz4))]
    #[cfg_attr(feature = "snappy", case(Compression::Snappy))]
    fn test_wrap_reader_streams_large_input(#[case] format: Compression) {
        let original: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
        let compressed = format.compress(&original).unwrap();
        let mut reader = format.wrap_reader(Cursor::new(compressed)).expect("decoder to initialize");
        let mut decompressed = Vec::new();
        reader.read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed, original);
    }

    #[rstest]
    #[case(Compression::Gzip)]
    #[case(Compression::Bzip2)]
    fn test_concatenated_members_are_all_read(#[case] format: Compression) {
        let mut joined = format.compress(b"first half, ").unwrap();
        joined.extend(format.compress(b"second half").unwrap());
        assert_eq!(format.decompress(&joined).unwrap(), b"first half, second half");
    }

    #[test]
    fn test_empty_input() {
        let compressed = Compression::Gzip.compress(b"").unwrap();
        assert!(Compression::Gzip.decompress(&compressed).unwrap().is_empty());
    }
}
