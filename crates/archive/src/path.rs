//! Member name normalization and destination path handling.

use crate::Options;
use crate::error::{ErrorKind, Result};
use codepage_437::{CP437_CONTROL, FromCp437};
use exn::ResultExt;
use std::fs;
use std::path::{Path, PathBuf};

/// Normalizes a stored member name into a relative, `/`-separated path.
///
/// Backslashes (common in DOS-era archives) are treated as separators and
/// `.`/empty segments are dropped. Returns `Ok(None)` when the name refers to
/// the archive root itself (`./`).
///
/// # Errors
/// [`InvalidEntry`](ErrorKind::InvalidEntry) when the name climbs above the
/// archive root or contains a null byte.
pub(crate) fn normalize(name: &str) -> Result<Option<String>> {
    let unified = name.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                if segments.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidEntry(name.to_string()));
                }
            },
            s if s.contains('\0') => exn::bail!(ErrorKind::InvalidEntry(name.to_string())),
            s => segments.push(s),
        }
    }
    match segments.is_empty() {
        true => Ok(None),
        false => Ok(Some(segments.join("/"))),
    }
}

/// Decodes raw member name bytes: UTF-8 when valid, code page 437 otherwise.
pub(crate) fn decode_name(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(name) => name.to_string(),
        Err(_) => String::from_cp437(bytes.to_vec(), &CP437_CONTROL),
    }
}

pub(crate) fn prepare_destination(destination: &Path, options: &Options) -> Result<()> {
    if destination.is_dir() {
        return Ok(());
    }
    if !options.create_dirs {
        exn::bail!(ErrorKind::Io(destination.to_path_buf()));
    }
    fs::create_dir_all(destination).or_raise(|| ErrorKind::Io(destination.to_path_buf()))
}

/// Resolves where a file member is written, creating parents and clearing any
/// existing entry as [`Options`] allow.
pub(crate) fn file_target(destination: &Path, name: &str, options: &Options) -> Result<PathBuf> {
    let target = destination.join(name);
    if let Some(parent) = target.parent()
        && !parent.is_dir()
    {
        if !options.create_dirs {
            exn::bail!(ErrorKind::Io(parent.to_path_buf()));
        }
        fs::create_dir_all(parent).or_raise(|| ErrorKind::Io(parent.to_path_buf()))?;
    }
    if target.exists() {
        if !options.overwrite {
            exn::bail!(ErrorKind::AlreadyExists(target));
        }
        if target.is_file() {
            fs::remove_file(&target).or_raise(|| ErrorKind::Io(target.clone()))?;
        }
    }
    Ok(target)
}

pub(crate) fn dir_target(destination: &Path, name: &str) -> Result<PathBuf> {
    let target = destination.join(name);
    fs::create_dir_all(&target).or_raise(|| ErrorKind::Io(target.clone()))?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("demo/readme.nfo", Some("demo/readme.nfo"))]
    #[case("./demo/readme.nfo", Some("demo/readme.nfo"))]
    #[case("/demo//readme.nfo", Some("demo/readme.nfo"))]
    #[case("DEMO\\FILE_ID.DIZ", Some("DEMO/FILE_ID.DIZ"))]
    #[case("demo/", Some("demo"))]
    #[case("demo/sub/../readme.nfo", Some("demo/readme.nfo"))]
    #[case("./", None)]
    #[case("", None)]
    fn test_normalize(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(normalize(name).unwrap().as_deref(), expected);
    }

    #[rstest]
    #[case("../etc/passwd")]
    #[case("demo/../../escape")]
    #[case("..\\..\\autoexec.bat")]
    #[case("bad\0name")]
    fn test_normalize_rejects(#[case] name: &str) {
        assert!(normalize(name).is_err());
    }

    #[test]
    fn test_decode_name() {
        assert_eq!(decode_name(b"readme.nfo"), "readme.nfo");
        assert_eq!(decode_name("café.txt".as_bytes()), "café.txt");
        // 0x82 is `é` and 0x9A is `Ü` in code page 437, and neither is valid UTF-8 on its own.
        assert_eq!(decode_name(b"caf\x82.txt"), "café.txt");
        assert_eq!(decode_name(b"\x9aber.nfo"), "Über.nfo");
    }

    #[test]
    fn test_file_target_respects_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"old").unwrap();
        let keep = Options { overwrite: false, create_dirs: true };
        assert!(file_target(dir.path(), "a.txt", &keep).is_err());
        let target = file_target(dir.path(), "a.txt", &Options::default()).unwrap();
        assert!(!target.exists());
        let nested = file_target(dir.path(), "x/y/b.txt", &Options::default()).unwrap();
        assert!(nested.parent().unwrap().is_dir());
    }
}
