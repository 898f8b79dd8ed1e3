//! Layered configuration for relic.
//!
//! Values are merged, later sources winning:
//!
//! 1. built-in defaults,
//! 2. one TOML, YAML or JSON file (chosen by extension),
//! 3. environment variables prefixed `RELIC_`, with `__` separating nested
//!    keys (`RELIC_MAGIC__TIMEOUT_MS=250`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use relic_extract::{PatternExtractor, Registry};
use relic_integrity::MagicCommand;
use relic_library::{DEFAULT_PLATFORM, DEFAULT_SECTION, ImportOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

pub const ENV_PREFIX: &str = "RELIC_";
const ENV_SPLIT: &str = "__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub output: Option<PathBuf>,
    pub strict: bool,
    pub keep_on_failure: bool,
    /// Parent of the extraction directories.
    pub scratch: Option<PathBuf>,
    pub section: String,
    pub platform: String,
}
impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            output: None,
            strict: false,
            keep_on_failure: true,
            scratch: None,
            section: DEFAULT_SECTION.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagicConfig {
    pub enabled: bool,
    pub program: String,
    /// Placed before the path on the command line.
    pub args: Vec<String>,
    pub timeout_ms: u64,
}
impl Default for MagicConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: relic_integrity::DEFAULT_PROGRAM.to_string(),
            args: Vec::new(),
            timeout_ms: relic_integrity::DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Stems besides the archive's own that mark a file as the release's.
    pub variants: Vec<String>,
}

/// Descriptor grammar for one releasing group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Regex with a `title` capture.
    pub title: Option<String>,
    /// Regex with `year`, `month` and `day` captures.
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub import: ImportConfig,
    pub magic: MagicConfig,
    pub ranking: RankingConfig,
    /// Keyed by releasing group name.
    pub groups: BTreeMap<String, GroupConfig>,
}
impl Config {
    /// Where the configuration file lives when none is named.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "relic").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The merged providers, without extracting them.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match path {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::File(path.to_path_buf()));
                }
                figment = merge_file(figment, path)?;
            },
            None => {
                if let Some(path) = Self::default_path() {
                    figment = figment.merge(Toml::file(path));
                }
            },
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SPLIT)))
    }

    /// Loads and validates the configuration.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Config = Self::figment(path)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.magic.timeout_ms == 0 {
            exn::bail!(ErrorKind::Invalid("magic.timeout_ms".to_string()));
        }
        if self.magic.program.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("magic.program".to_string()));
        }
        if self.import.section.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("import.section".to_string()));
        }
        if self.import.platform.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("import.platform".to_string()));
        }
        self.registry()?;
        Ok(())
    }

    /// Metadata extractors for every configured group.
    pub fn registry(&self) -> Result<Registry> {
        let mut registry = Registry::new();
        for (group, grammar) in &self.groups {
            let extractor = PatternExtractor::new(grammar.title.as_deref(), grammar.date.as_deref())
                .or_raise(|| ErrorKind::Invalid(format!("groups.{group}")))?;
            registry.register(group, extractor);
        }
        Ok(registry)
    }

    /// File type detection settings; `None` when disabled.
    pub fn magic_command(&self) -> Option<MagicCommand> {
        self.magic.enabled.then(|| {
            MagicCommand::new(self.magic.program.trim())
                .with_args(&self.magic.args)
                .with_timeout(Duration::from_millis(self.magic.timeout_ms))
        })
    }

    pub fn import_options(&self) -> ImportOptions {
        ImportOptions {
            output: self.import.output.clone(),
            strict: self.import.strict,
            keep_on_failure: self.import.keep_on_failure,
            scratch: self.import.scratch.clone(),
            section: self.import.section.clone(),
            platform: self.import.platform.clone(),
            magic: self.magic_command(),
            variants: self.ranking.variants.clone(),
        }
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().map(|extension| extension.to_string_lossy().to_lowercase());
    let figment = match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::File(path.to_path_buf())),
    };
    Ok(figment)
}
