use crate::Options;
use crate::error::{ErrorKind, Result};
use crate::path::{file_target, normalize};
use exn::{OptionExt, ResultExt};
use relic_compress::Compression;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Name of the decompressed file: the declared filename minus its final extension.
fn output_name(filename: &str) -> Result<String> {
    let base = filename.trim().rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem = base.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(base);
    normalize(stem)?.ok_or_raise(|| ErrorKind::InvalidEntry(filename.to_string()))
}

pub(crate) fn extract(
    source: &Path,
    filename: &str,
    compression: Compression,
    destination: &Path,
    options: &Options,
) -> Result<()> {
    let name = output_name(filename)?;
    let file = File::open(source).or_raise(|| ErrorKind::Io(source.to_path_buf()))?;
    let mut reader = compression.wrap_reader(BufReader::new(file)).or_raise(|| ErrorKind::Corrupt(source.to_path_buf()))?;
    let target = file_target(destination, &name, options)?;
    let mut output = File::create(&target).or_raise(|| ErrorKind::Io(target.clone()))?;
    io::copy(&mut reader, &mut output).or_raise(|| ErrorKind::Corrupt(source.to_path_buf()))?;
    tracing::debug!(member = %name, %compression, "decompressed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("readme.txt.gz", "readme.txt")]
    #[case("README.TXT.BZ2", "README.TXT")]
    #[case("nested/path/file_id.diz.xz", "file_id.diz")]
    fn test_output_name(#[case] filename: &str, #[case] expected: &str) {
        assert_eq!(output_name(filename).unwrap(), expected);
    }

    #[test]
    fn test_extract_bzip2() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("blob");
        std::fs::write(&source, Compression::Bzip2.compress(b"greetings").unwrap()).unwrap();
        extract(&source, "notes.txt.bz2", Compression::Bzip2, dir.path(), &Options::default()).unwrap();
        assert_eq!(std::fs::read(dir.path().join("notes.txt")).unwrap(), b"greetings");
    }
}
