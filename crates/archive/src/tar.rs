use crate::error::{ErrorKind, Result};
use crate::path::{decode_name, dir_target, file_target, normalize};
use crate::{Member, Options, dostime};
use exn::ResultExt;
use relic_compress::Compression;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use time::OffsetDateTime;

fn open(source: &Path, compression: Compression) -> Result<::tar::Archive<Box<dyn Read>>> {
    let file = File::open(source).or_raise(|| ErrorKind::Io(source.to_path_buf()))?;
    let reader = compression.wrap_reader(BufReader::new(file)).or_raise(|| ErrorKind::Corrupt(source.to_path_buf()))?;
    Ok(::tar::Archive::new(reader))
}

/// Walks every entry in the tarball, handing regular files and directories to
/// `visit` along with their normalized names. Other entry types (links,
/// devices, FIFOs) are skipped.
fn for_each<F>(source: &Path, compression: Compression, mut visit: F) -> Result<()>
where
    F: FnMut(&mut ::tar::Entry<'_, Box<dyn Read>>, String, Member) -> Result<()>,
{
    let mut archive = open(source, compression)?;
    let entries = archive.entries().or_raise(|| ErrorKind::Corrupt(source.to_path_buf()))?;
    for entry in entries {
        let mut entry = entry.or_raise(|| ErrorKind::Corrupt(source.to_path_buf()))?;
        let raw_name = decode_name(&entry.path_bytes());
        let Some(name) = normalize(&raw_name)? else {
            continue;
        };
        let kind = entry.header().entry_type();
        if !kind.is_file() && !kind.is_dir() {
            tracing::debug!(member = %name, ?kind, "skipping special tar entry");
            continue;
        }
        let modified = entry
            .header()
            .mtime()
            .ok()
            .and_then(|seconds| OffsetDateTime::from_unix_timestamp(seconds as i64).ok());
        let member = Member { name: name.clone(), size: entry.size(), modified, is_dir: kind.is_dir() };
        visit(&mut entry, name, member)?;
    }
    Ok(())
}

pub(crate) fn list(source: &Path, compression: Compression) -> Result<Vec<Member>> {
    let mut members = Vec::new();
    for_each(source, compression, |_, _, member| {
        members.push(member);
        Ok(())
    })?;
    Ok(members)
}

pub(crate) fn extract(source: &Path, compression: Compression, destination: &Path, options: &Options) -> Result<()> {
    for_each(source, compression, |entry, name, member| {
        if member.is_dir {
            dir_target(destination, &name)?;
            return Ok(());
        }
        let target = file_target(destination, &name, options)?;
        let mut output = File::create(&target).or_raise(|| ErrorKind::Io(target.clone()))?;
        io::copy(entry, &mut output).or_raise(|| ErrorKind::InvalidEntry(name.clone()))?;
        drop(output);
        dostime::restore_mtime(&target, member.modified).or_raise(|| ErrorKind::Io(target.clone()))?;
        tracing::debug!(member = %name, "extracted");
        Ok(())
    })
}
