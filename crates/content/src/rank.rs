//! Priority-ranked selection of the one file that best represents a release.
//!
//! Two passes share one rule table shape: the *description* pass looks at
//! text files (NFO first, then TXT, then DIZ), the *executable* pass at
//! programs (EXE, then COM, then BAT). Within each pass, a file named after
//! the archive beats one named after a known variant stem, which beats any
//! other file of the same extension. Lower ranks are better.

use crate::file::{File, FileSet};
use std::collections::BTreeMap;
use tracing::instrument;

/// Lowest-numbered rank a candidate can receive.
pub const BEST_RANK: u8 = 1;
/// Highest-numbered rank a candidate can receive.
pub const WORST_RANK: u8 = 9;

/// Filename-to-rank mapping for one ranking pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    ranks: BTreeMap<String, u8>,
}
impl Ranking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a candidate. A name offered twice keeps its better rank.
    pub fn insert(&mut self, name: impl Into<String>, rank: u8) {
        self.ranks.entry(name.into()).and_modify(|current| *current = (*current).min(rank)).or_insert(rank);
    }

    pub fn rank(&self, name: &str) -> Option<u8> {
        self.ranks.get(name).copied()
    }

    /// The winning filename: lowest rank, then lower-cased name, then name.
    pub fn top(&self) -> Option<&str> {
        self.ranks
            .iter()
            .min_by(|(a, a_rank), (b, b_rank)| {
                a_rank.cmp(b_rank).then_with(|| a.to_lowercase().cmp(&b.to_lowercase())).then_with(|| a.cmp(b))
            })
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

/// Extensions and well-known names for one pass, in rule table order.
#[derive(Debug, Clone, Copy)]
struct Rules {
    primary: &'static str,
    secondary: &'static str,
    well_known: &'static str,
    fallback: &'static str,
}

const DESCRIPTION: Rules = Rules { primary: "nfo", secondary: "txt", well_known: "file_id.diz", fallback: "diz" };
const EXECUTABLE: Rules = Rules { primary: "exe", secondary: "com", well_known: "start.bat", fallback: "bat" };

/// Ranks candidates against one archive.
#[derive(Debug, Clone)]
pub struct Selector {
    base: String,
    variants: Vec<String>,
}
impl Selector {
    /// `archive` is the archive's declared filename; its final extension (and
    /// an inner `.tar`) is dropped to form the base stem. `variants` are
    /// further stems that mark a file as belonging to the release, such as the
    /// releasing group's name.
    pub fn new<S: AsRef<str>>(archive: &str, variants: &[S]) -> Self {
        let archive = archive.rsplit(['/', '\\']).next().unwrap_or(archive).to_lowercase();
        let base = archive.rsplit_once('.').map(|(stem, _)| stem.to_string()).unwrap_or(archive);
        // `demo.tar.gz` names the same release as `demo.tgz`.
        let base = match base.strip_suffix(".tar") {
            Some(stem) if !stem.is_empty() => stem.to_string(),
            _ => base,
        };
        let variants = variants.iter().map(|v| v.as_ref().trim().to_lowercase()).filter(|v| !v.is_empty()).collect();
        Self { base, variants }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn rank(&self, rules: &Rules, name: &str) -> Option<u8> {
        let (stem, extension) = name.rsplit_once('.')?;
        let is_base = stem == self.base;
        let is_variant = self.variants.iter().any(|variant| variant == stem);
        let rank = match extension {
            e if e == rules.primary && is_base => 1,
            e if e == rules.primary && is_variant => 2,
            e if e == rules.secondary && is_base => 3,
            e if e == rules.secondary && is_variant => 4,
            e if e == rules.primary => 5,
            _ if name == rules.well_known => 6,
            e if e == rules.fallback && is_base => 7,
            e if e == rules.secondary => 8,
            e if e == rules.fallback => 9,
            _ => return None,
        };
        Some(rank)
    }

    fn pass(&self, rules: &Rules, files: &FileSet, eligible: impl Fn(&File) -> bool) -> Ranking {
        let mut ranking = Ranking::new();
        for file in files.files().filter(|file| eligible(file)) {
            if let Some(rank) = self.rank(rules, &file.folded_name()) {
                tracing::debug!(name = %file.name, rank, "ranked candidate");
                ranking.insert(file.name.clone(), rank);
            }
        }
        ranking
    }

    /// Ranks the text files that could describe the release.
    #[instrument(level = "debug", skip_all, fields(base = %self.base, candidates))]
    pub fn description(&self, files: &FileSet) -> Ranking {
        let ranking = self.pass(&DESCRIPTION, files, |file| file.is_textfile);
        tracing::Span::current().record("candidates", ranking.len());
        ranking
    }

    /// Ranks the programs that could prove the release runs.
    #[instrument(level = "debug", skip_all, fields(base = %self.base, candidates))]
    pub fn executable(&self, files: &FileSet) -> Ranking {
        let ranking = self.pass(&EXECUTABLE, files, |file| file.is_executable);
        tracing::Span::current().record("candidates", ranking.len());
        ranking
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::PathBuf;

    fn files(names: &[&str]) -> FileSet {
        names
            .iter()
            .map(|name| {
                let extension = crate::file::extension_of(name);
                File {
                    name: name.to_string(),
                    is_executable: crate::file::EXECUTABLE_EXTENSIONS.contains(&extension.as_str()),
                    is_textfile: crate::file::TEXT_EXTENSIONS.contains(&extension.as_str()),
                    extension,
                    path: PathBuf::from(name),
                    mime: "text/plain".into(),
                    size: 1,
                }
            })
            .collect()
    }

    #[test]
    fn test_description_prefers_archive_nfo() {
        let selector = Selector::new::<&str>("app.zip", &[]);
        let ranking = selector.description(&files(&["app.nfo", "app.txt", "random.nfo"]));
        assert_eq!(ranking.rank("app.nfo"), Some(1));
        assert_eq!(ranking.rank("app.txt"), Some(3));
        assert_eq!(ranking.rank("random.nfo"), Some(5));
        assert_eq!(ranking.top(), Some("app.nfo"));
    }

    #[rstest]
    #[case("demo.tar.gz")]
    #[case("DEMO.TAR.XZ")]
    #[case("demo.tgz")]
    fn test_tarball_base_ranks_first(#[case] archive: &str) {
        let selector = Selector::new::<&str>(archive, &[]);
        let ranking = selector.description(&files(&["demo.nfo", "other.nfo"]));
        assert_eq!(ranking.rank("demo.nfo"), Some(1));
        assert_eq!(ranking.top(), Some("demo.nfo"));
    }

    #[rstest]
    #[case("demo.nfo", 1)]
    #[case("GRP.NFO", 2)]
    #[case("demo.txt", 3)]
    #[case("grp.txt", 4)]
    #[case("other.nfo", 5)]
    #[case("FILE_ID.DIZ", 6)]
    #[case("demo.diz", 7)]
    #[case("other.txt", 8)]
    #[case("other.diz", 9)]
    fn test_description_table(#[case] name: &str, #[case] expected: u8) {
        let selector = Selector::new("Demo.ZIP", &["grp"]);
        assert_eq!(selector.description(&files(&[name])).rank(name), Some(expected));
    }

    #[rstest]
    #[case("demo.exe", 1)]
    #[case("grp.exe", 2)]
    #[case("demo.com", 3)]
    #[case("grp.com", 4)]
    #[case("install.exe", 5)]
    #[case("START.BAT", 6)]
    #[case("demo.bat", 7)]
    #[case("other.com", 8)]
    #[case("other.bat", 9)]
    fn test_executable_table(#[case] name: &str, #[case] expected: u8) {
        let selector = Selector::new("demo.zip", &["grp"]);
        assert_eq!(selector.executable(&files(&[name])).rank(name), Some(expected));
    }

    #[test]
    fn test_ineligible_files_are_excluded() {
        let selector = Selector::new::<&str>("demo.zip", &[]);
        let set = files(&["demo.png", "readme", "demo.exe", "setup.ini"]);
        let description = selector.description(&set);
        assert!(description.is_empty());
        assert_eq!(description.top(), None);
        let executable = selector.executable(&set);
        assert_eq!(executable.len(), 1);
        assert_eq!(executable.top(), Some("demo.exe"));
    }

    #[test]
    fn test_top_is_deterministic() {
        let selector = Selector::new::<&str>("demo.zip", &[]);
        let forward = selector.description(&files(&["b.nfo", "A.nfo", "c.nfo", "a.NFO"]));
        let backward = selector.description(&files(&["a.NFO", "c.nfo", "A.nfo", "b.nfo"]));
        assert_eq!(forward.top(), Some("A.nfo"));
        assert_eq!(forward.top(), backward.top());
    }

    #[test]
    fn test_ranking_keeps_best_rank() {
        let mut ranking = Ranking::new();
        ranking.insert("x.nfo", 5);
        ranking.insert("x.nfo", 2);
        ranking.insert("x.nfo", 8);
        assert_eq!(ranking.rank("x.nfo"), Some(2));
    }

    #[test]
    fn test_selector_base() {
        assert_eq!(Selector::new::<&str>("path/to/Pack.Tar.GZ", &[]).base(), "pack");
        assert_eq!(Selector::new::<&str>("demo.tbz2", &[]).base(), "demo");
        assert_eq!(Selector::new::<&str>(".tar.gz", &[]).base(), ".tar");
        assert_eq!(Selector::new::<&str>("noext", &[]).base(), "noext");
    }
}
