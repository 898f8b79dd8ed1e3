//! Import of DOS-era release archives: a container is extracted, its members
//! are grouped into releases, and every release is repacked under a fresh
//! identifier and described by a [`Record`].
//!
//! ```no_run
//! use relic_library::{ImportOptions, Importer};
//!
//! let importer = Importer::new(ImportOptions { magic: None, ..ImportOptions::default() });
//! let batch = importer.import("/incoming/upload-1234", "Super.Frog-RAZOR.zip")?;
//! for record in batch.records() {
//!     println!("{} {} {}", record.uuid, record.title, record.strong_hash);
//! }
//! # Ok::<(), relic_library::error::Error>(())
//! ```

pub mod error;
mod importer;
mod pack;
mod record;
mod title;
mod walk;

pub use crate::importer::{Batch, BatchState, Importer, New, RecordsBuilt, Stored, Walked};
pub use crate::pack::{Packed, artifact_name, pack};
pub use crate::record::{DEFAULT_PLATFORM, DEFAULT_SECTION, ImportOptions, Record};
pub use crate::title::{group_name, title};
pub use crate::walk::{Counts, DESCRIPTOR_NAME, Release, ReleaseFile, WalkResult, walk, walk_archive};
