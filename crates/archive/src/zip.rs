use crate::error::{ErrorKind, Result};
use crate::path::{dir_target, file_target, normalize};
use crate::{Member, Options, dostime};
use ::zip::result::ZipError;
use ::zip::write::SimpleFileOptions;
use ::zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};
use exn::ResultExt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

fn open(source: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(source).or_raise(|| ErrorKind::Io(source.to_path_buf()))?;
    ZipArchive::new(BufReader::new(file)).or_raise(|| ErrorKind::Corrupt(source.to_path_buf()))
}

fn modified(datetime: Option<DateTime>) -> Option<OffsetDateTime> {
    let dt = datetime?;
    dostime::from_parts(dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute(), dt.second())
}

pub(crate) fn list(source: &Path) -> Result<Vec<Member>> {
    let mut archive = open(source)?;
    let mut members = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        // Raw access reads the central directory only, so members using
        // methods that cannot be decompressed are still listed.
        let file = archive.by_index_raw(index).or_raise(|| ErrorKind::Corrupt(source.to_path_buf()))?;
        let Some(name) = normalize(file.name())? else {
            continue;
        };
        members.push(Member {
            name,
            size: if file.is_dir() { 0 } else { file.size() },
            modified: modified(file.last_modified()),
            is_dir: file.is_dir(),
        });
    }
    Ok(members)
}

pub(crate) fn extract(source: &Path, destination: &Path, options: &Options) -> Result<()> {
    let mut archive = open(source)?;
    for index in 0..archive.len() {
        let mut file = match archive.by_index(index) {
            Ok(file) => file,
            Err(ZipError::UnsupportedArchive(reason)) => {
                tracing::warn!(index, reason, "zip member uses an unsupported method");
                exn::bail!(ErrorKind::NotExtractable(format!("zip ({reason})")));
            },
            Err(err) => return Err(err).or_raise(|| ErrorKind::Corrupt(source.to_path_buf())),
        };
        let Some(name) = normalize(file.name())? else {
            continue;
        };
        if file.is_dir() {
            dir_target(destination, &name)?;
            continue;
        }
        let target = file_target(destination, &name, options)?;
        let mut output = File::create(&target).or_raise(|| ErrorKind::Io(target.clone()))?;
        io::copy(&mut file, &mut output).or_raise(|| ErrorKind::InvalidEntry(name.clone()))?;
        drop(output);
        dostime::restore_mtime(&target, modified(file.last_modified())).or_raise(|| ErrorKind::Io(target.clone()))?;
        tracing::debug!(member = %name, "extracted");
    }
    Ok(())
}

/// Earliest and latest instants a ZIP header can record.
const DOS_EPOCH: (u16, u16) = (1980, 2107);

fn to_zip_time(modified: OffsetDateTime, name: &str) -> DateTime {
    let modified = modified.to_offset(time::UtcOffset::UTC);
    let year = modified.year();
    let clamped = if year < i32::from(DOS_EPOCH.0) {
        Some(DateTime::default())
    } else if year > i32::from(DOS_EPOCH.1) {
        DateTime::from_date_and_time(DOS_EPOCH.1, 12, 31, 23, 59, 58).ok()
    } else {
        None
    };
    if let Some(clamped) = clamped {
        tracing::warn!(member = name, %modified, "modification time outside the ZIP range, clamping");
        return clamped;
    }
    DateTime::from_date_and_time(
        year as u16,
        modified.month() as u8,
        modified.day(),
        modified.hour(),
        modified.minute(),
        modified.second(),
    )
    .unwrap_or_default()
}

/// Writes a new Deflate-compressed ZIP archive, one file at a time.
///
/// Members keep the order they are added in. Recorded times are clamped to
/// the range a DOS timestamp can represent.
pub struct ZipBuilder {
    path: PathBuf,
    writer: ZipWriter<BufWriter<File>>,
    count: usize,
}
impl ZipBuilder {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).or_raise(|| ErrorKind::Io(path.clone()))?;
        Ok(Self { writer: ZipWriter::new(BufWriter::new(file)), path, count: 0 })
    }

    /// Appends the contents of `source` as the member `name`.
    pub fn add_file(&mut self, name: &str, source: &Path, modified: Option<OffsetDateTime>) -> Result<()> {
        let Some(name) = normalize(name)? else {
            exn::bail!(ErrorKind::InvalidEntry(name.to_string()));
        };
        let mut options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        if let Some(modified) = modified {
            options = options.last_modified_time(to_zip_time(modified, &name));
        }
        let mut input = File::open(source).or_raise(|| ErrorKind::Io(source.to_path_buf()))?;
        self.writer.start_file(name.as_str(), options).or_raise(|| ErrorKind::Io(self.path.clone()))?;
        io::copy(&mut input, &mut self.writer).or_raise(|| ErrorKind::Io(self.path.clone()))?;
        self.count += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Writes the central directory and closes the file.
    pub fn finish(self) -> Result<PathBuf> {
        let path = self.path;
        let mut inner = self.writer.finish().or_raise(|| ErrorKind::Io(path.clone()))?;
        io::Write::flush(&mut inner).or_raise(|| ErrorKind::Io(path.clone()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::ops::Deref;

    fn write_fixture(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        let stamp = DateTime::from_date_and_time(1996, 3, 15, 13, 45, 30).unwrap();
        for (name, data) in entries {
            let options = SimpleFileOptions::default().last_modified_time(stamp);
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_list_and_extract() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("demo.zip");
        write_fixture(&source, &[("demo/", b""), ("demo/readme.nfo", b"hello"), ("demo/install.exe", b"MZ")]);

        let members = list(&source).unwrap();
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["demo", "demo/readme.nfo", "demo/install.exe"]);
        assert!(members[0].is_dir);
        assert_eq!(members[1].size, 5);
        let expected = dostime::from_parts(1996, 3, 15, 13, 45, 30);
        assert_eq!(members[1].modified, expected);

        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        extract(&source, &out, &Options::default()).unwrap();
        assert_eq!(std::fs::read(out.join("demo/readme.nfo")).unwrap(), b"hello");
        let mtime = OffsetDateTime::from(std::fs::metadata(out.join("demo/install.exe")).unwrap().modified().unwrap());
        assert_eq!(Some(mtime), expected);
    }

    #[test]
    fn test_escaping_member_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("evil.zip");
        write_fixture(&source, &[("ok.txt", b"fine"), ("../escape.txt", b"bad")]);
        let err = list(&source).unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::InvalidEntry(_)));
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        assert!(extract(&source, &out, &Options::default()).is_err());
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_corrupt_archive() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("junk.zip");
        std::fs::write(&source, b"this is not a zip file at all").unwrap();
        let err = list(&source).unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::Corrupt(_)));
    }

    #[test]
    fn test_builder_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("readme.nfo");
        std::fs::write(&input, b"greets").unwrap();
        let when = dostime::from_parts(1995, 11, 2, 8, 30, 10);
        let early = dostime::from_parts(1970, 1, 1, 0, 0, 0);

        let mut builder = ZipBuilder::create(dir.path().join("out.zip")).unwrap();
        assert!(builder.is_empty());
        builder.add_file("demo/readme.nfo", &input, when).unwrap();
        builder.add_file("demo/old.txt", &input, early).unwrap();
        assert_eq!(builder.len(), 2);
        let path = builder.finish().unwrap();

        let members = list(&path).unwrap();
        assert_eq!(members[0].name, "demo/readme.nfo");
        assert_eq!(members[0].modified, when);
        assert_eq!(members[1].modified, dostime::from_parts(1980, 1, 1, 0, 0, 0));
    }
}
