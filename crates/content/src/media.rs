use crate::file::{File, FileSet};

/// The preview image and plain text file picked from one release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Media<'a> {
    /// Largest raster image by size; the lowest key wins a tie.
    pub preview: Option<&'a File>,
    /// Text file with the lowest key.
    pub textfile: Option<&'a File>,
}

/// Picks the preview image and first text file in a single pass.
///
/// The text category stops being considered as soon as one file matched,
/// which never changes the outcome because keys are visited in ascending
/// order.
pub fn select(files: &FileSet) -> Media<'_> {
    let mut media = Media::default();
    let mut text_found = false;
    for (_, file) in files.iter() {
        if file.is_image() && media.preview.is_none_or(|best| file.size > best.size) {
            media.preview = Some(file);
        }
        if !text_found && file.is_textfile {
            media.textfile = Some(file);
            text_found = true;
        }
    }
    media
}

/// Largest raster image in the set.
pub fn largest_image(files: &FileSet) -> Option<&File> {
    select(files).preview
}

/// Text file with the lowest key in the set.
pub fn first_textfile(files: &FileSet) -> Option<&File> {
    select(files).textfile
}
