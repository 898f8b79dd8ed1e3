use relic_integrity::MagicCommand;
use std::path::PathBuf;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

pub const DEFAULT_SECTION: &str = "releaseadvert";
pub const DEFAULT_PLATFORM: &str = "dos";

/// A packed release, ready to hand to persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    pub uuid: Uuid,
    pub title: String,
    pub release_group: Option<String>,
    /// Base name of the packed artifact.
    pub file_name: String,
    pub file_size: u64,
    /// `None` when file type detection is disabled.
    pub magic_type: Option<String>,
    pub strong_hash: String,
    pub weak_hash: String,
    /// Oldest modification time among the release's files.
    pub last_modified: Option<OffsetDateTime>,
    pub published: Option<Date>,
    pub section: String,
    pub platform: String,
    /// Text of the release's `file_id.diz`.
    pub comment: Option<String>,
    /// Best description file.
    pub readme: Option<String>,
    /// Best proof executable.
    pub executable: Option<String>,
    /// Largest raster image.
    pub preview: Option<String>,
    /// First text file.
    pub textfile: Option<String>,
}

/// Settings for one [`Importer`](crate::Importer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Where packed artifacts go; a temporary directory owned by the batch
    /// when unset.
    pub output: Option<PathBuf>,
    /// Fail on the first file that cannot be classified instead of skipping it.
    pub strict: bool,
    /// Leave the extraction directory behind when a batch fails.
    pub keep_on_failure: bool,
    /// Parent of the per-batch extraction directories; the system temporary
    /// directory when unset.
    pub scratch: Option<PathBuf>,
    pub section: String,
    pub platform: String,
    /// File type detection; skipped when `None`.
    pub magic: Option<MagicCommand>,
    /// Extra stems that mark a file as belonging to the release when ranking.
    pub variants: Vec<String>,
}
impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            output: None,
            strict: false,
            keep_on_failure: true,
            scratch: None,
            section: DEFAULT_SECTION.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            magic: Some(MagicCommand::default()),
            variants: Vec::new(),
        }
    }
}
