//! Title and release-date extraction from the descriptor text of a release.
//!
//! Every releasing group writes its info files differently, so extraction is a
//! capability ([`MetadataExtractor`]) looked up by group name in a
//! [`Registry`]. Groups without a registered grammar resolve to [`Noop`],
//! which contributes nothing.

mod consts;
pub mod error;
mod pattern;

use crate::error::{ErrorKind, Result};
pub use crate::pattern::{CENTURY_PIVOT, PatternExtractor};
use codepage_437::{CP437_CONTROL, FromCp437};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use time::Date;
use tracing::instrument;

/// Metadata recovered from a descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extracted {
    pub title: Option<String>,
    pub published: Option<Date>,
}

/// A grammar that understands one releasing group's descriptor files.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<Extracted>;
}

/// The extractor for groups nobody wrote a grammar for.
#[derive(Debug, Clone, Copy, Default)]
pub struct Noop;
impl MetadataExtractor for Noop {
    fn extract(&self, _text: &str) -> Result<Extracted> {
        Ok(Extracted::default())
    }
}

static NOOP: Noop = Noop;

/// Extractors keyed by case-insensitive group name.
#[derive(Default)]
pub struct Registry {
    extractors: HashMap<String, Box<dyn MetadataExtractor>>,
}
impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut groups: Vec<_> = self.extractors.keys().collect();
        groups.sort();
        f.debug_struct("Registry").field("groups", &groups).finish()
    }
}
impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `extractor` for `group`, replacing any earlier one.
    pub fn register(&mut self, group: &str, extractor: impl MetadataExtractor + 'static) -> &mut Self {
        self.extractors.insert(fold(group), Box::new(extractor));
        self
    }

    pub fn with(mut self, group: &str, extractor: impl MetadataExtractor + 'static) -> Self {
        self.register(group, extractor);
        self
    }

    pub fn contains(&self, group: &str) -> bool {
        self.extractors.contains_key(&fold(group))
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// The extractor registered for `group`.
    ///
    /// # Errors
    /// [`ErrorKind::UnknownGroup`] when nothing is registered under that name.
    pub fn get(&self, group: &str) -> Result<&dyn MetadataExtractor> {
        match self.extractors.get(&fold(group)) {
            Some(extractor) => Ok(extractor.as_ref()),
            None => exn::bail!(ErrorKind::UnknownGroup(group.to_string())),
        }
    }

    /// The extractor registered for `group`, or [`Noop`].
    pub fn resolve(&self, group: &str) -> &dyn MetadataExtractor {
        self.get(group).unwrap_or(&NOOP)
    }

    /// Decodes raw descriptor bytes and runs the group's extractor over them.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub fn extract(&self, group: &str, bytes: &[u8]) -> Result<Extracted> {
        self.resolve(group).extract(&decode_text(bytes))
    }
}

fn fold(group: &str) -> String {
    group.trim().to_lowercase()
}

/// Decodes descriptor bytes as UTF-8, falling back to code page 437 for the
/// DOS-era files that predate it.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => String::from_cp437(bytes.to_vec(), &CP437_CONTROL),
    }
}
