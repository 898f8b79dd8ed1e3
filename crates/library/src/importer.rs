//! Batch import of one release container.
//!
//! A [`Batch`] moves through its stages as a typestate, so a stage can only
//! run once the one before it has succeeded:
//!
//! ```text
//! Batch<New> ──walk()──▶ Batch<Walked> ──store()──▶ Batch<Stored> ──build_records()──▶ Batch<RecordsBuilt>
//! ```
//!
//! The container is extracted into a scratch directory that lives until the
//! records are built. If any stage fails, the artifacts already packed are
//! removed, the scratch directory is left in place for inspection (unless
//! [`ImportOptions::keep_on_failure`] is off) and the whole batch is abandoned.

use crate::error::{Error, ErrorKind, Result};
use crate::pack::{Packed, pack};
use crate::record::{ImportOptions, Record};
use crate::walk::{Release, WalkResult, walk};
use exn::ResultExt;
use relic_archive::{Archive, Member};
use relic_content::Selector;
use relic_extract::{Extracted, Registry, decode_text};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

mod sealed {
    pub trait Sealed {}
}
pub trait BatchState: sealed::Sealed {}

/// Directories are prepared; nothing has been read yet.
pub struct New;
impl sealed::Sealed for New {}
impl BatchState for New {}

/// The container is extracted and its releases grouped.
pub struct Walked {
    walk: WalkResult,
}
impl sealed::Sealed for Walked {}
impl BatchState for Walked {}

/// Every release has been packed into the output directory.
pub struct Stored {
    walk: WalkResult,
    packed: Vec<Packed>,
}
impl sealed::Sealed for Stored {}
impl BatchState for Stored {}

/// Records are assembled and the scratch directory is gone.
pub struct RecordsBuilt {
    records: Vec<Record>,
    artifacts: Vec<PathBuf>,
}
impl sealed::Sealed for RecordsBuilt {}
impl BatchState for RecordsBuilt {}

enum Output {
    Temporary(TempDir),
    Directory(PathBuf),
}
impl Output {
    fn path(&self) -> &Path {
        match self {
            Output::Temporary(dir) => dir.path(),
            Output::Directory(path) => path,
        }
    }
}

struct Scratch {
    dir: TempDir,
    keep_on_failure: bool,
}
impl Scratch {
    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn abandon(self, err: Error) -> Error {
        match self.keep_on_failure {
            true => {
                let path = self.dir.keep();
                tracing::warn!(path = %path.display(), error = ?err, "batch failed; keeping extracted files");
            },
            false => {
                if let Err(cleanup) = self.dir.close() {
                    tracing::warn!(error = %cleanup, "could not remove extracted files");
                }
            },
        }
        err
    }

    fn close(self) {
        let path = self.path().to_path_buf();
        if let Err(err) = self.dir.close() {
            tracing::warn!(path = %path.display(), error = %err, "could not remove extracted files");
        }
    }
}

/// One container on its way from archive to records.
pub struct Batch<'i, S: BatchState> {
    importer: &'i Importer,
    archive: Archive,
    scratch: Option<Scratch>,
    output: Output,
    state: S,
}
impl<'i, S: BatchState> Batch<'i, S> {
    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Where packed artifacts are written.
    pub fn output_dir(&self) -> &Path {
        self.output.path()
    }

    /// Where the container is extracted, until records are built.
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(Scratch::path)
    }

    fn advance<T: BatchState>(self, state: T) -> Batch<'i, T> {
        Batch { importer: self.importer, archive: self.archive, scratch: self.scratch, output: self.output, state }
    }

    fn fail(mut self, err: Error) -> Error {
        match self.scratch.take() {
            Some(scratch) => scratch.abandon(err),
            None => err,
        }
    }

    fn root(&self) -> Result<&Path> {
        match &self.scratch {
            Some(scratch) => Ok(scratch.path()),
            None => exn::bail!(ErrorKind::Io(self.archive.source().to_path_buf())),
        }
    }
}

impl<'i> Batch<'i, New> {
    fn new(importer: &'i Importer, source: &Path, filename: &str) -> Result<Self> {
        if source.as_os_str().is_empty() || filename.trim().is_empty() {
            exn::bail!(ErrorKind::NoSource);
        }
        let archive = Archive::open(source, filename).or_raise(|| ErrorKind::Archive(source.to_path_buf()))?;
        let scratch = match &importer.options.scratch {
            Some(parent) => {
                fs::create_dir_all(parent).or_raise(|| ErrorKind::Io(parent.clone()))?;
                tempfile::Builder::new().prefix("relic-extract-").tempdir_in(parent)
            },
            None => tempfile::Builder::new().prefix("relic-extract-").tempdir(),
        }
        .or_raise(|| ErrorKind::Io(importer.options.scratch.clone().unwrap_or_else(std::env::temp_dir)))?;
        let output = match &importer.options.output {
            Some(path) => {
                fs::create_dir_all(path).or_raise(|| ErrorKind::Io(path.clone()))?;
                Output::Directory(path.clone())
            },
            None => Output::Temporary(
                tempfile::Builder::new()
                    .prefix("relic-output-")
                    .tempdir()
                    .or_raise(|| ErrorKind::Io(std::env::temp_dir()))?,
            ),
        };
        let scratch = Scratch { dir: scratch, keep_on_failure: importer.options.keep_on_failure };
        Ok(Self { importer, archive, scratch: Some(scratch), output, state: New })
    }

    /// Extracts the container and groups its members into releases.
    #[instrument(skip(self), fields(source = %self.archive.source().display(), filename = %self.archive.filename()))]
    pub fn walk(self) -> Result<Batch<'i, Walked>> {
        match self.walk_inner() {
            Ok(walk) => Ok(self.advance(Walked { walk })),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn walk_inner(&self) -> Result<WalkResult> {
        let root = self.root()?;
        let source = self.archive.source().to_path_buf();
        self.archive.extract(root).or_raise(|| ErrorKind::Archive(source.clone()))?;
        let members = match self.archive.codec().can_list() {
            true => self.archive.list().or_raise(|| ErrorKind::Archive(source.clone()))?,
            false => members_of(root)?,
        };
        walk(self.archive.filename(), &members, root).or_raise(|| ErrorKind::Walk(source))
    }
}

/// Members of a container that has no member table, read back from its
/// extraction.
fn members_of(root: &Path) -> Result<Vec<Member>> {
    let mut members = Vec::new();
    for entry in fs::read_dir(root).or_raise(|| ErrorKind::Io(root.to_path_buf()))? {
        let entry = entry.or_raise(|| ErrorKind::Io(root.to_path_buf()))?;
        let metadata = entry.metadata().or_raise(|| ErrorKind::Io(entry.path()))?;
        if !metadata.is_file() {
            continue;
        }
        members.push(Member {
            name: entry.file_name().to_string_lossy().into_owned(),
            size: metadata.len(),
            modified: metadata.modified().ok().map(OffsetDateTime::from),
            is_dir: false,
        });
    }
    members.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(members)
}

impl<'i> Batch<'i, Walked> {
    pub fn walk_result(&self) -> &WalkResult {
        &self.state.walk
    }

    /// Packs every release into the output directory.
    #[instrument(skip(self), fields(releases = self.state.walk.len()))]
    pub fn store(self) -> Result<Batch<'i, Stored>> {
        match self.store_inner() {
            Ok(packed) => Ok(Batch {
                importer: self.importer,
                archive: self.archive,
                scratch: self.scratch,
                output: self.output,
                state: Stored { walk: self.state.walk, packed },
            }),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn store_inner(&self) -> Result<Vec<Packed>> {
        let root = self.root()?;
        let output = self.output.path();
        let mut packed = Vec::with_capacity(self.state.walk.len());
        for release in self.state.walk.releases.values() {
            match pack(release, &release.directory(root), output) {
                Ok(artifact) => packed.push(artifact),
                Err(err) => {
                    discard(&packed);
                    return Err(err);
                },
            }
        }
        Ok(packed)
    }
}

impl<'i> Batch<'i, Stored> {
    pub fn walk_result(&self) -> &WalkResult {
        &self.state.walk
    }

    /// Packed artifacts, in release key order.
    pub fn packed(&self) -> &[Packed] {
        &self.state.packed
    }

    /// Hashes every artifact and assembles its record, then removes the
    /// scratch directory.
    #[instrument(skip(self), fields(releases = self.state.packed.len()))]
    pub fn build_records(self) -> Result<Batch<'i, RecordsBuilt>> {
        match self.build_records_inner() {
            Ok(records) => {
                let artifacts = self.state.packed.iter().map(|packed| packed.path.clone()).collect();
                let mut batch = Batch {
                    importer: self.importer,
                    archive: self.archive,
                    scratch: self.scratch,
                    output: self.output,
                    state: RecordsBuilt { records, artifacts },
                };
                if let Some(scratch) = batch.scratch.take() {
                    scratch.close();
                }
                tracing::info!(records = batch.state.records.len(), "batch complete");
                Ok(batch)
            },
            Err(err) => {
                discard(&self.state.packed);
                Err(self.fail(err))
            },
        }
    }

    fn build_records_inner(&self) -> Result<Vec<Record>> {
        let root = self.root()?;
        let group = self.state.walk.group.as_deref();
        self.state
            .walk
            .releases
            .values()
            .zip(&self.state.packed)
            .map(|(release, packed)| {
                self.importer
                    .record(self.archive.filename(), group, release, packed, root)
                    .or_raise(|| ErrorKind::Record(release.key.clone()))
            })
            .collect()
    }
}

/// Removes the artifacts of a batch that will not produce records.
fn discard(packed: &[Packed]) {
    for artifact in packed {
        match fs::remove_file(&artifact.path) {
            Ok(()) => tracing::debug!(path = %artifact.path.display(), "removed artifact of failed batch"),
            Err(err) => {
                tracing::warn!(path = %artifact.path.display(), error = %err, "could not remove artifact of failed batch")
            },
        }
    }
}

impl<'i> Batch<'i, RecordsBuilt> {
    pub fn records(&self) -> &[Record] {
        &self.state.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.state.records
    }

    /// Path of the artifact packed for the release `id`.
    ///
    /// # Errors
    /// [`ErrorKind::InvalidIdentifier`] when `id` is not a UUID.
    pub fn artifact(&self, id: &str) -> Result<Option<&Path>> {
        let uuid = Uuid::parse_str(id.trim()).or_raise(|| ErrorKind::InvalidIdentifier(id.to_string()))?;
        Ok(self
            .state
            .records
            .iter()
            .zip(&self.state.artifacts)
            .find(|(record, _)| record.uuid == uuid)
            .map(|(_, path)| path.as_path()))
    }

    /// Detaches the output directory from the batch so it outlives it.
    pub fn keep_output(self) -> PathBuf {
        match self.output {
            Output::Temporary(dir) => dir.keep(),
            Output::Directory(path) => path,
        }
    }
}

/// Turns release containers into packed artifacts and records.
#[derive(Debug, Default)]
pub struct Importer {
    options: ImportOptions,
    registry: Registry,
}
impl Importer {
    pub fn new(options: ImportOptions) -> Self {
        Self { options, registry: Registry::default() }
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prepares a batch for the container at `source`, whose format is implied
    /// by its declared `filename`.
    ///
    /// # Errors
    /// [`ErrorKind::NoSource`] for a blank path or filename, before any I/O.
    pub fn begin(&self, source: impl AsRef<Path>, filename: &str) -> Result<Batch<'_, New>> {
        Batch::new(self, source.as_ref(), filename)
    }

    /// Runs every stage for one container.
    #[instrument(skip(self, source), fields(source = %source.as_ref().display()))]
    pub fn import(&self, source: impl AsRef<Path>, filename: &str) -> Result<Batch<'_, RecordsBuilt>> {
        self.begin(source, filename)?.walk()?.store()?.build_records()
    }

    fn record(
        &self,
        archive: &str,
        group: Option<&str>,
        release: &Release,
        packed: &Packed,
        root: &Path,
    ) -> Result<Record> {
        let directory = release.directory(root);
        let files =
            relic_content::scan(&directory, self.options.strict).or_raise(|| ErrorKind::Io(directory.clone()))?;
        let mut variants = self.options.variants.clone();
        variants.extend(group.map(str::to_string));
        let selector = Selector::new(archive, variants.as_slice());
        let media = relic_content::select(&files);
        let fingerprint = relic_integrity::fingerprint(&packed.path, self.options.magic.as_ref())
            .or_raise(|| ErrorKind::Io(packed.path.clone()))?;
        let readme = selector.description(&files).top().map(str::to_string);
        let description = match (release.description_bytes(), &readme) {
            (Some(bytes), _) => Some(Cow::Borrowed(bytes)),
            (None, Some(name)) => {
                let path = directory.join(name);
                match fs::read(&path) {
                    Ok(bytes) => Some(Cow::Owned(bytes)),
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "could not read description");
                        None
                    },
                }
            },
            (None, None) => None,
        };
        let extracted = match description {
            Some(bytes) => self.registry.extract(group.unwrap_or_default(), &bytes).unwrap_or_else(|err| {
                tracing::warn!(key = %release.key, error = ?err, "metadata extraction failed");
                Extracted::default()
            }),
            None => Extracted::default(),
        };
        Ok(Record {
            uuid: release.uuid,
            title: extracted.title.unwrap_or_else(|| release.title.clone()),
            release_group: group.map(str::to_string),
            file_name: packed.file_name(),
            file_size: packed.bytes,
            magic_type: fingerprint.magic,
            strong_hash: fingerprint.strong,
            weak_hash: fingerprint.weak,
            last_modified: release.earliest,
            published: extracted.published,
            section: self.options.section.clone(),
            platform: self.options.platform.clone(),
            comment: release.descriptor.as_deref().map(|bytes| decode_text(bytes).trim().to_string()),
            readme,
            executable: selector.executable(&files).top().map(str::to_string),
            preview: media.preview.map(|file| file.name.clone()),
            textfile: media.textfile.map(|file| file.name.clone()),
        })
    }
}
