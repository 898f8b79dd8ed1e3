//! Partitioning of a multi-release container into per-release units.

use crate::error::{ErrorKind, Result};
use crate::title::{group_name, last_segment, title};
use exn::ResultExt;
use relic_archive::{Archive, Member};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

/// Conventional name of the short descriptor file.
pub const DESCRIPTOR_NAME: &str = "file_id.diz";

/// One member file of a release, as recorded during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFile {
    /// Base file name inside the release directory.
    pub name: String,
    pub modified: Option<OffsetDateTime>,
}

/// The members that share one parent directory inside the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Parent directory of the members, `/`-separated; empty for the root.
    pub key: String,
    pub title: String,
    pub uuid: Uuid,
    /// Files in the order the container stores them.
    pub files: Vec<ReleaseFile>,
    /// Oldest modification time among the files.
    pub earliest: Option<OffsetDateTime>,
    /// Information file named after the releasing group or the release.
    pub readme: Option<String>,
    /// Raw bytes of the release's `file_id.diz`.
    pub descriptor: Option<Vec<u8>>,
    /// Raw bytes of [`readme`](Self::readme).
    pub readme_text: Option<Vec<u8>>,
}
impl Release {
    /// An empty release with a fresh identifier.
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            uuid: Uuid::new_v4(),
            files: Vec::new(),
            earliest: None,
            readme: None,
            descriptor: None,
            readme_text: None,
        }
    }

    /// Directory of the release below an extraction root.
    pub fn directory(&self, root: &Path) -> PathBuf {
        match self.key.is_empty() {
            true => root.to_path_buf(),
            false => root.join(&self.key),
        }
    }

    /// Final segment of the key; empty for root releases.
    pub fn name(&self) -> &str {
        last_segment(&self.key)
    }

    fn add(&mut self, name: &str, modified: Option<OffsetDateTime>) {
        match self.files.iter_mut().find(|file| file.name == name) {
            // A repeated member overwrote the earlier one on extraction.
            Some(existing) => existing.modified = modified,
            None => self.files.push(ReleaseFile { name: name.to_string(), modified }),
        }
        if let Some(modified) = modified
            && self.earliest.is_none_or(|earliest| modified < earliest)
        {
            self.earliest = Some(modified);
        }
    }

    /// Descriptor text to hand to a metadata extractor, readme first.
    pub fn description_bytes(&self) -> Option<&[u8]> {
        self.readme_text.as_deref().or(self.descriptor.as_deref())
    }
}

/// How many members of each class the walk saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    /// `.diz` descriptors.
    pub descriptors: usize,
    /// `.nfo` information files.
    pub information: usize,
    pub other: usize,
}

/// Everything a walk learns about a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkResult {
    pub releases: BTreeMap<String, Release>,
    /// Releasing group named by the first member's top-level directory.
    pub group: Option<String>,
    pub counts: Counts,
}
impl WalkResult {
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

enum Class {
    Descriptor,
    Information,
    Other,
}

fn classify(file_name: &str) -> Class {
    match relic_content::extension_of(file_name).as_str() {
        "diz" => Class::Descriptor,
        "nfo" => Class::Information,
        _ => Class::Other,
    }
}

fn stem(file_name: &str) -> &str {
    file_name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file_name)
}

/// Stem of the container's filename used to title root-level members: the
/// archive extension goes, along with an inner `.tar` or the extension of the
/// single file a bare compressed container holds.
fn archive_stem(archive: &str) -> &str {
    let stem = stem(last_segment(archive));
    if let Some((inner, extension)) = stem.rsplit_once('.')
        && !inner.is_empty()
    {
        let extension = extension.to_lowercase();
        let known = extension == "tar"
            || relic_content::TEXT_EXTENSIONS.contains(&extension.as_str())
            || relic_content::EXECUTABLE_EXTENSIONS.contains(&extension.as_str());
        if known {
            return inner;
        }
    }
    stem
}

fn read(root: &Path, member: &Member) -> Result<Vec<u8>> {
    let path = root.join(&member.name);
    std::fs::read(&path).or_raise(|| ErrorKind::Io(path))
}

/// Groups `members` by parent directory.
///
/// `archive` is the container's declared filename; root-level members take
/// their title from its stem. Descriptor and readme bytes are read from the
/// container's extraction under `root`.
#[instrument(skip(members, root), fields(members = members.len(), releases, group))]
pub fn walk(archive: &str, members: &[Member], root: &Path) -> Result<WalkResult> {
    let mut result = WalkResult::default();
    let archive_stem = archive_stem(archive);
    for member in members.iter().filter(|member| !member.is_dir) {
        if result.group.is_none() && result.releases.is_empty() {
            result.group = group_name(&member.name);
        }
        let key = member.parent();
        let release = result.releases.entry(key.to_string()).or_insert_with(|| {
            let title = match key.is_empty() {
                true => title(archive_stem),
                false => title(key),
            };
            tracing::debug!(key, %title, "new release");
            Release::new(key, title)
        });
        let file_name = member.file_name();
        release.add(file_name, member.modified);
        match classify(file_name) {
            Class::Descriptor => {
                result.counts.descriptors += 1;
                if release.descriptor.is_none() && file_name.eq_ignore_ascii_case(DESCRIPTOR_NAME) {
                    release.descriptor = Some(read(root, member)?);
                }
            },
            Class::Information => {
                result.counts.information += 1;
                let stem = stem(file_name);
                let is_readme = result.group.as_deref().is_some_and(|group| stem.eq_ignore_ascii_case(group))
                    || (!key.is_empty() && stem.eq_ignore_ascii_case(release.name()));
                if release.readme.is_none() && is_readme {
                    release.readme = Some(file_name.to_string());
                    release.readme_text = Some(read(root, member)?);
                }
            },
            Class::Other => result.counts.other += 1,
        }
    }
    let span = tracing::Span::current();
    span.record("releases", result.releases.len());
    if let Some(group) = &result.group {
        span.record("group", group.as_str());
    }
    tracing::info!(releases = result.releases.len(), ?result.counts, "walk complete");
    Ok(result)
}

/// Lists `archive` and groups the members extracted below `root`.
pub fn walk_archive(archive: &Archive, root: &Path) -> Result<WalkResult> {
    let members = archive.list().or_raise(|| ErrorKind::Archive(archive.source().to_path_buf()))?;
    walk(archive.filename(), &members, root).or_raise(|| ErrorKind::Walk(archive.source().to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::datetime;

    fn member(name: &str, modified: Option<OffsetDateTime>) -> Member {
        Member { name: name.into(), size: 1, modified, is_dir: false }
    }

    fn fixture() -> (tempfile::TempDir, Vec<Member>) {
        let dir = tempfile::tempdir().unwrap();
        let members = vec![
            Member { name: "Super.Frog.v1.2-RAZOR".into(), size: 0, modified: None, is_dir: true },
            member("Super.Frog.v1.2-RAZOR/frog.exe", Some(datetime!(1994-03-01 10:00 UTC))),
            member("Super.Frog.v1.2-RAZOR/FILE_ID.DIZ", Some(datetime!(1994-02-01 10:00 UTC))),
            member("Super.Frog.v1.2-RAZOR/razor.nfo", Some(datetime!(1994-02-15 10:00 UTC))),
            member("Skyroads-RAZOR/sky.exe", None),
            member("Skyroads-RAZOR/Skyroads-RAZOR.NFO", Some(datetime!(1993-12-24 00:00 UTC))),
            member("loose.txt", None),
        ];
        for member in &members {
            let path = dir.path().join(&member.name);
            match member.is_dir {
                true => std::fs::create_dir_all(path).unwrap(),
                false => {
                    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                    std::fs::write(path, member.file_name()).unwrap();
                },
            }
        }
        (dir, members)
    }

    #[test]
    fn test_walk_groups_by_parent() {
        let (dir, members) = fixture();
        let result = walk("RAZOR-PACK.ZIP", &members, dir.path()).unwrap();
        assert_eq!(result.group.as_deref(), Some("RAZOR"));
        let keys: Vec<_> = result.releases.keys().map(String::as_str).collect();
        assert_eq!(keys, ["", "Skyroads-RAZOR", "Super.Frog.v1.2-RAZOR"]);
        assert_eq!(result.counts, Counts { descriptors: 1, information: 2, other: 3 });

        let frog = &result.releases["Super.Frog.v1.2-RAZOR"];
        assert_eq!(frog.title, "Super Frog v1.2");
        let names: Vec<_> = frog.files.iter().map(|file| file.name.as_str()).collect();
        assert_eq!(names, ["frog.exe", "FILE_ID.DIZ", "razor.nfo"]);
        assert_eq!(frog.earliest, Some(datetime!(1994-02-01 10:00 UTC)));
        assert_eq!(frog.descriptor.as_deref(), Some(&b"FILE_ID.DIZ"[..]));
        assert_eq!(frog.readme.as_deref(), Some("razor.nfo"));
        assert_eq!(frog.description_bytes(), Some(&b"razor.nfo"[..]));

        let sky = &result.releases["Skyroads-RAZOR"];
        assert_eq!(sky.readme.as_deref(), Some("Skyroads-RAZOR.NFO"));
        assert_eq!(sky.descriptor, None);

        let root = &result.releases[""];
        assert_eq!(root.title, "RAZOR");
        assert_eq!(root.directory(dir.path()), dir.path());
        assert_eq!(root.earliest, None);
    }

    #[rstest]
    #[case("RAZOR-PACK.ZIP", "RAZOR-PACK")]
    #[case("lonely.nfo.gz", "lonely")]
    #[case("uploads/demo.tar.gz", "demo")]
    #[case("Super.Frog.v1.2.zip", "Super.Frog.v1.2")]
    #[case("go.exe.bz2", "go")]
    #[case(".nfo.gz", ".nfo")]
    fn test_archive_stem(#[case] archive: &str, #[case] expected: &str) {
        assert_eq!(archive_stem(archive), expected);
    }

    #[test]
    fn test_root_title_ignores_inner_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lonely.nfo"), b"x").unwrap();
        let result = walk("lonely.nfo.gz", &[member("lonely.nfo", None)], dir.path()).unwrap();
        assert_eq!(result.releases[""].title, "lonely");
    }

    #[test]
    fn test_walk_is_deterministic() {
        let (dir, members) = fixture();
        let first = walk("pack.zip", &members, dir.path()).unwrap();
        let second = walk("pack.zip", &members, dir.path()).unwrap();
        assert_eq!(first.counts, second.counts);
        assert_eq!(first.group, second.group);
        for ((key_a, a), (key_b, b)) in first.releases.iter().zip(second.releases.iter()) {
            assert_eq!(key_a, key_b);
            assert_eq!(a.title, b.title);
            assert_eq!(a.files, b.files);
            assert_ne!(a.uuid, b.uuid);
        }
        // Identifiers are unique within a batch.
        let mut ids: Vec<_> = first.releases.values().map(|release| release.uuid).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), first.len());
    }

    #[test]
    fn test_every_release_has_files() {
        let (dir, members) = fixture();
        let result = walk("pack.zip", &members, dir.path()).unwrap();
        assert!(result.releases.values().all(|release| !release.files.is_empty()));
    }

    #[test]
    fn test_repeated_member_is_recorded_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.exe"), b"x").unwrap();
        let members = [member("a.exe", None), member("a.exe", Some(datetime!(1990-01-01 0:00 UTC)))];
        let result = walk("a.zip", &members, dir.path()).unwrap();
        let release = &result.releases[""];
        assert_eq!(release.files.len(), 1);
        assert_eq!(release.files[0].modified, Some(datetime!(1990-01-01 0:00 UTC)));
    }

    #[test]
    fn test_missing_descriptor_bytes_fail() {
        let dir = tempfile::tempdir().unwrap();
        let members = [member("demo/file_id.diz", None)];
        assert!(walk("demo.zip", &members, dir.path()).is_err());
    }
}
