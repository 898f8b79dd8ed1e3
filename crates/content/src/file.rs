use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::instrument;
use walkdir::WalkDir;

/// Extensions of plain-text and descriptor files.
pub const TEXT_EXTENSIONS: [&str; 6] = ["txt", "nfo", "diz", "asc", "1st", "me"];
/// Extensions of runnable DOS programs.
pub const EXECUTABLE_EXTENSIONS: [&str; 3] = ["exe", "com", "bat"];
/// Sniffed content types that count as a raster preview image.
pub const RASTER_IMAGES: [&str; 6] = ["image/png", "image/jpeg", "image/gif", "image/bmp", "image/webp", "image/tiff"];

const SNIFF_LENGTH: u64 = 8192;
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";
const EMPTY: &str = "application/x-empty";

/// One classified file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// Final path segment, as found on disk.
    pub name: String,
    /// Lower-cased extension without the dot; empty when there is none.
    pub extension: String,
    pub path: PathBuf,
    /// Content type sniffed from the leading bytes.
    pub mime: String,
    pub size: u64,
    pub is_executable: bool,
    pub is_textfile: bool,
}
impl File {
    /// Lower-cased file name, the form every ranking rule compares against.
    pub fn folded_name(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn is_image(&self) -> bool {
        RASTER_IMAGES.contains(&self.mime.as_str())
    }
}

/// Extension of the final segment of `name`, lower-cased.
pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => extension.to_lowercase(),
        _ => String::new(),
    }
}

/// Classifies one filesystem entry.
///
/// # Errors
/// [`ErrorKind::Classification`] when the entry has no file name or its
/// leading bytes cannot be read for sniffing.
pub fn classify(path: impl AsRef<Path>) -> Result<File> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_raise(|| ErrorKind::Classification(path.to_path_buf()))?;
    let extension = extension_of(&name);
    let metadata = fs::metadata(path).or_raise(|| ErrorKind::Classification(path.to_path_buf()))?;
    let mime = sniff(path).or_raise(|| ErrorKind::Classification(path.to_path_buf()))?;
    Ok(File {
        is_executable: EXECUTABLE_EXTENSIONS.contains(&extension.as_str()),
        is_textfile: TEXT_EXTENSIONS.contains(&extension.as_str()),
        name,
        extension,
        path: path.to_path_buf(),
        mime,
        size: metadata.len(),
    })
}

fn sniff(path: &Path) -> std::io::Result<String> {
    let mut head = Vec::with_capacity(SNIFF_LENGTH as usize);
    fs::File::open(path)?.take(SNIFF_LENGTH).read_to_end(&mut head)?;
    Ok(sniff_bytes(&head).to_string())
}

/// Content type of a file from its leading bytes.
pub fn sniff_bytes(head: &[u8]) -> &'static str {
    if head.is_empty() {
        return EMPTY;
    }
    if let Some(kind) = infer::get(head) {
        return kind.mime_type();
    }
    // A multi-byte character cut off by the sniff window is still text.
    let utf8 = match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(err) => err.error_len().is_none(),
    };
    match utf8 && !head.contains(&0) {
        true => TEXT_PLAIN,
        false => OCTET_STREAM,
    }
}

/// Every classified file of one extraction, keyed by discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: BTreeMap<usize, File>,
}
impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file under the next free key and returns that key.
    pub fn push(&mut self, file: File) -> usize {
        let key = self.files.last_key_value().map(|(key, _)| key + 1).unwrap_or(0);
        self.files.insert(key, file);
        key
    }

    pub fn insert(&mut self, key: usize, file: File) -> Option<File> {
        self.files.insert(key, file)
    }

    pub fn get(&self, key: usize) -> Option<&File> {
        self.files.get(&key)
    }

    /// Files in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &File)> {
        self.files.iter().map(|(key, file)| (*key, file))
    }

    pub fn files(&self) -> impl Iterator<Item = &File> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
impl FromIterator<File> for FileSet {
    fn from_iter<I: IntoIterator<Item = File>>(iter: I) -> Self {
        let mut set = FileSet::new();
        for file in iter {
            set.push(file);
        }
        set
    }
}

/// Classifies the regular files (and links to them) directly inside
/// `directory`, sorted by name.
///
/// A file that cannot be classified is skipped with a warning, unless
/// `strict` is set, in which case the first failure is returned.
#[instrument(skip(directory), fields(directory = %directory.as_ref().display(), files))]
pub fn scan(directory: impl AsRef<Path>, strict: bool) -> Result<FileSet> {
    let directory = directory.as_ref();
    let mut set = FileSet::new();
    let walker = WalkDir::new(directory).follow_links(false).min_depth(1).max_depth(1).sort_by_file_name();
    for entry in walker {
        let entry = entry.or_raise(|| ErrorKind::Scan(directory.to_path_buf()))?;
        let file_type = entry.file_type();
        // Links are classified through their target; a dangling one cannot be.
        if !(file_type.is_file() || (file_type.is_symlink() && !entry.path().is_dir())) {
            continue;
        }
        match classify(entry.path()) {
            Ok(file) => {
                tracing::debug!(name = %file.name, mime = %file.mime, "classified");
                set.push(file);
            },
            Err(err) if strict => return Err(err),
            Err(err) => tracing::warn!(path = %entry.path().display(), error = %err, "skipping unclassifiable file"),
        }
    }
    tracing::Span::current().record("files", set.len());
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::ops::Deref;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR\x00\x00\x00\x01\x00\x00\x00\x01\x08\x06\x00\x00\x00";

    #[rstest]
    #[case("README.NFO", "nfo", false, true)]
    #[case("file_id.diz", "diz", false, true)]
    #[case("Install.EXE", "exe", true, false)]
    #[case("go.bat", "bat", true, false)]
    #[case("screen.png", "png", false, false)]
    #[case("noextension", "", false, false)]
    #[case(".hidden", "", false, false)]
    fn test_classify_flags(
        #[case] name: &str,
        #[case] extension: &str,
        #[case] is_executable: bool,
        #[case] is_textfile: bool,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, b"content").unwrap();
        let file = classify(&path).unwrap();
        assert_eq!(file.name, name);
        assert_eq!(file.extension, extension);
        assert_eq!(file.extension, file.extension.to_lowercase());
        assert_eq!(file.is_executable, is_executable);
        assert_eq!(file.is_textfile, is_textfile);
        assert!(!(file.is_executable && file.is_textfile));
        assert_eq!(file.size, 7);
    }

    #[rstest]
    #[case(PNG, "image/png")]
    #[case(b"GIF89a\x01\x00\x01\x00", "image/gif")]
    #[case(b"plain old text\r\n", TEXT_PLAIN)]
    #[case("caf\u{e9}".as_bytes(), TEXT_PLAIN)]
    #[case(b"\x00\x01\x02\x03", OCTET_STREAM)]
    #[case(b"", EMPTY)]
    fn test_sniff_bytes(#[case] head: &[u8], #[case] expected: &str) {
        assert_eq!(sniff_bytes(head), expected);
    }

    #[test]
    fn test_sniff_ignores_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screen.txt");
        fs::write(&path, PNG).unwrap();
        let file = classify(&path).unwrap();
        assert_eq!(file.mime, "image/png");
        assert!(file.is_image());
        assert!(file.is_textfile);
    }

    #[test]
    fn test_classify_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(classify(dir.path().join("gone.nfo")).is_err());
    }

    #[test]
    fn test_scan_sorted_and_flat() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["zeta.txt", "alpha.exe", "Mid.nfo"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/deep.txt"), b"x").unwrap();
        let set = scan(dir.path(), true).unwrap();
        let names: Vec<_> = set.files().map(|file| file.name.as_str()).collect();
        assert_eq!(names, ["Mid.nfo", "alpha.exe", "zeta.txt"]);
        assert_eq!(set.get(1).unwrap().name, "alpha.exe");
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_unclassifiable_entry() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("demo.exe"), b"MZ").unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.nfo"), dir.path().join("dangling.nfo")).unwrap();

        let set = scan(dir.path(), false).unwrap();
        let names: Vec<_> = set.files().map(|file| file.name.as_str()).collect();
        assert_eq!(names, ["demo.exe"]);

        let err = scan(dir.path(), true).unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::Classification(path) if path.ends_with("dangling.nfo")));
    }

    #[test]
    fn test_file_set_keys() {
        let file = |name: &str| File {
            name: name.into(),
            extension: extension_of(name),
            path: PathBuf::from(name),
            mime: TEXT_PLAIN.into(),
            size: 1,
            is_executable: false,
            is_textfile: true,
        };
        let mut set: FileSet = [file("a.txt"), file("b.txt")].into_iter().collect();
        assert_eq!(set.insert(7, file("c.txt")), None);
        assert_eq!(set.push(file("d.txt")), 8);
        assert_eq!(set.len(), 4);
    }
}
