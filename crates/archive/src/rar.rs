use crate::error::{ErrorKind, Result};
use crate::path::{dir_target, file_target, normalize};
use crate::{Member, Options, dostime};
use exn::ResultExt;
use std::path::Path;

pub(crate) fn list(source: &Path) -> Result<Vec<Member>> {
    let archive = unrar::Archive::new(source)
        .open_for_listing()
        .or_raise(|| ErrorKind::Corrupt(source.to_path_buf()))?;
    let mut members = Vec::new();
    for header in archive {
        let header = header.or_raise(|| ErrorKind::Corrupt(source.to_path_buf()))?;
        let Some(name) = normalize(&header.filename.to_string_lossy())? else {
            continue;
        };
        members.push(Member {
            name,
            size: header.unpacked_size,
            modified: dostime::from_packed(header.file_time),
            is_dir: header.is_directory(),
        });
    }
    Ok(members)
}

pub(crate) fn extract(source: &Path, destination: &Path, options: &Options) -> Result<()> {
    let mut archive = unrar::Archive::new(source)
        .open_for_processing()
        .or_raise(|| ErrorKind::Corrupt(source.to_path_buf()))?;
    while let Some(header) = archive.read_header().or_raise(|| ErrorKind::Corrupt(source.to_path_buf()))? {
        let entry = header.entry();
        let modified = dostime::from_packed(entry.file_time);
        let name = normalize(&entry.filename.to_string_lossy())?;
        archive = match name {
            Some(name) if entry.is_directory() => {
                dir_target(destination, &name)?;
                header.skip().or_raise(|| ErrorKind::Corrupt(source.to_path_buf()))?
            },
            Some(name) => {
                let target = file_target(destination, &name, options)?;
                let next = header.extract_to(&target).or_raise(|| ErrorKind::InvalidEntry(name.clone()))?;
                dostime::restore_mtime(&target, modified).or_raise(|| ErrorKind::Io(target.clone()))?;
                tracing::debug!(member = %name, "extracted");
                next
            },
            None => header.skip().or_raise(|| ErrorKind::Corrupt(source.to_path_buf()))?,
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::Deref;

    #[test]
    fn test_unreadable_archive() {
        let dir = tempfile::tempdir().unwrap();
        let err = list(&dir.path().join("missing.rar")).unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::Corrupt(_)));
    }
}
