//! Classification of extracted release files, and selection of the files that
//! describe, prove and preview a release.
//!
//! ```no_run
//! use relic_content::{Selector, scan};
//!
//! let files = scan("/tmp/extracted/demo", false)?;
//! let selector = Selector::new("demo.zip", &["razor"]);
//! let readme = selector.description(&files).top().map(str::to_string);
//! # Ok::<(), relic_content::error::Error>(())
//! ```

pub mod error;
mod file;
mod media;
mod rank;

pub use crate::file::{
    EXECUTABLE_EXTENSIONS, File, FileSet, RASTER_IMAGES, TEXT_EXTENSIONS, classify, extension_of, scan, sniff_bytes,
};
pub use crate::media::{Media, first_textfile, largest_image, select};
pub use crate::rank::{BEST_RANK, Ranking, Selector, WORST_RANK};
