//! Repackaging of a grouped release into one content-addressed artifact.

use crate::error::{ErrorKind, Result};
use crate::walk::Release;
use exn::ResultExt;
use filetime::FileTime;
use relic_archive::ZipBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// A release written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packed {
    pub path: PathBuf,
    pub bytes: u64,
}
impl Packed {
    /// Base name of the artifact.
    pub fn file_name(&self) -> String {
        self.path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
    }
}

/// Artifact name for `release`: `<uuid>.zip` when it holds several files,
/// otherwise `<uuid>` plus the lower-cased extension of its one file.
pub fn artifact_name(release: &Release) -> String {
    match release.files.as_slice() {
        [single] => match relic_content::extension_of(&single.name) {
            extension if extension.is_empty() => release.uuid.to_string(),
            extension => format!("{}.{extension}", release.uuid),
        },
        _ => format!("{}.zip", release.uuid),
    }
}

/// Packs the files of `release`, read from `source`, into `destination`.
///
/// # Errors
/// [`ErrorKind::EmptyRelease`] when the release has no files, otherwise
/// [`ErrorKind::Pack`] naming the release key.
#[instrument(skip(release, source, destination), fields(key = %release.key, files = release.files.len(), bytes))]
pub fn pack(release: &Release, source: &Path, destination: &Path) -> Result<Packed> {
    if release.files.is_empty() {
        exn::bail!(ErrorKind::EmptyRelease(release.key.clone()));
    }
    let packed = match pack_inner(release, source, destination) {
        Ok(packed) => packed,
        Err(err) => {
            let target = destination.join(artifact_name(release));
            if let Err(cleanup) = fs::remove_file(&target)
                && cleanup.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(path = %target.display(), error = %cleanup, "could not remove partial artifact");
            }
            return Err(err.raise(ErrorKind::Pack(release.key.clone())));
        },
    };
    tracing::Span::current().record("bytes", packed.bytes);
    tracing::info!(key = %release.key, artifact = %packed.path.display(), "release packed");
    Ok(packed)
}

fn pack_inner(release: &Release, source: &Path, destination: &Path) -> Result<Packed> {
    let target = destination.join(artifact_name(release));
    match release.files.as_slice() {
        [single] => {
            let input = source.join(&single.name);
            fs::copy(&input, &target).or_raise(|| ErrorKind::Io(input.clone()))?;
            let modified = match single.modified {
                Some(modified) => FileTime::from_unix_time(modified.unix_timestamp(), 0),
                None => {
                    let metadata = fs::metadata(&input).or_raise(|| ErrorKind::Io(input.clone()))?;
                    FileTime::from_last_modification_time(&metadata)
                },
            };
            filetime::set_file_mtime(&target, modified).or_raise(|| ErrorKind::Io(target.clone()))?;
        },
        files => {
            let mut builder = ZipBuilder::create(&target).or_raise(|| ErrorKind::Io(target.clone()))?;
            for file in files {
                let input = source.join(&file.name);
                builder.add_file(&file.name, &input, file.modified).or_raise(|| ErrorKind::Io(input.clone()))?;
            }
            builder.finish().or_raise(|| ErrorKind::Io(target.clone()))?;
        },
    }
    let bytes = fs::metadata(&target).or_raise(|| ErrorKind::Io(target.clone()))?.len();
    Ok(Packed { path: target, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walk::ReleaseFile;
    use std::ops::Deref;
    use time::OffsetDateTime;
    use time::macros::datetime;

    fn release(names: &[(&str, Option<OffsetDateTime>)]) -> Release {
        let mut release = Release::new("demo", "demo");
        release.files = names
            .iter()
            .map(|(name, modified)| ReleaseFile { name: name.to_string(), modified: *modified })
            .collect();
        release
    }

    #[test]
    fn test_artifact_name() {
        let single = release(&[("INSTALL.EXE", None)]);
        assert_eq!(artifact_name(&single), format!("{}.exe", single.uuid));
        let bare = release(&[("README", None)]);
        assert_eq!(artifact_name(&bare), bare.uuid.to_string());
        let many = release(&[("a.exe", None), ("b.nfo", None)]);
        assert_eq!(artifact_name(&many), format!("{}.zip", many.uuid));
    }

    #[test]
    fn test_empty_release_guard() {
        let dir = tempfile::tempdir().unwrap();
        let err = pack(&release(&[]), dir.path(), dir.path()).unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::EmptyRelease(key) if key == "demo"));
    }

    #[test]
    fn test_single_file_copy() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("go.com"), b"\xcd\x20").unwrap();
        let when = datetime!(1992-06-01 12:00 UTC);
        let release = release(&[("go.com", Some(when))]);
        let packed = pack(&release, source.path(), output.path()).unwrap();
        assert_eq!(packed.bytes, 2);
        assert_eq!(std::fs::read(&packed.path).unwrap(), b"\xcd\x20");
        let modified = OffsetDateTime::from(std::fs::metadata(&packed.path).unwrap().modified().unwrap());
        assert_eq!(modified, when);
    }

    #[test]
    fn test_missing_member_fails() {
        let source = tempfile::tempdir().unwrap();
        let release = release(&[("a.exe", None), ("b.nfo", None)]);
        let err = pack(&release, source.path(), source.path()).unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::Pack(_)));
    }
}
