use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const BUFFER_SIZE: usize = 64 * 1024;

fn stream<R: Read>(mut reader: R, mut update: impl FnMut(&[u8])) -> io::Result<()> {
    let mut buffer = vec![0; BUFFER_SIZE];
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => return Ok(()),
            Ok(read) => update(&buffer[..read]),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

/// CRC-32 of everything `reader` yields, as 8 lower-case hex digits.
pub fn weak_hash_reader<R: Read>(reader: R) -> io::Result<String> {
    let mut hasher = crc32fast::Hasher::new();
    stream(reader, |chunk| hasher.update(chunk))?;
    Ok(format!("{:08x}", hasher.finalize()))
}

/// BLAKE3 of everything `reader` yields, as 64 lower-case hex digits.
pub fn strong_hash_reader<R: Read>(reader: R) -> io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    stream(reader, |chunk| {
        hasher.update(chunk);
    })?;
    Ok(hasher.finalize().to_hex().to_string())
}

fn with_fresh_handle(path: &Path, digest: fn(File) -> io::Result<String>) -> Result<String> {
    if path.as_os_str().is_empty() {
        exn::bail!(ErrorKind::NoSource);
    }
    let file = File::open(path).or_raise(|| ErrorKind::Hash(path.to_path_buf()))?;
    digest(file).or_raise(|| ErrorKind::Hash(path.to_path_buf()))
}

/// Weak (CRC-32) checksum of a file, read through its own handle.
pub fn weak_hash(path: impl AsRef<Path>) -> Result<String> {
    with_fresh_handle(path.as_ref(), weak_hash_reader)
}

/// Strong (BLAKE3) checksum of a file, read through its own handle.
pub fn strong_hash(path: impl AsRef<Path>) -> Result<String> {
    with_fresh_handle(path.as_ref(), strong_hash_reader)
}
