//! Human titles and releasing-group names derived from scene-style paths such
//! as `Super.Frog.v1.2.incl.Trn-RAZOR`.

use regex::Regex;
use std::sync::LazyLock;

static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|[^[:alnum:]])(v\d+(?:\.\d+){1,2})").unwrap());
static SEPARATOR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[._ ]+").unwrap());

const ABBREVIATIONS: [(&str, &str); 3] = [("incl", "including"), ("trn", "trainer"), ("regged", "registered")];

/// Last segment of a `/`-separated path.
pub(crate) fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Splits a trailing `-GROUP` off a name, returning `(name, group)`.
fn split_group(segment: &str) -> (&str, Option<&str>) {
    match segment.rsplit_once('-') {
        Some((name, group)) if !name.trim().is_empty() && !group.trim().is_empty() => (name, Some(group.trim())),
        _ => (segment, None),
    }
}

/// Releasing group named by the top-level segment of `path`, if it has a
/// `-GROUP` suffix.
pub fn group_name(path: &str) -> Option<String> {
    let top = path.trim_start_matches('/').split('/').next().unwrap_or(path);
    split_group(top).1.map(str::to_string)
}

fn collapse(text: &str) -> String {
    SEPARATOR_REGEX.replace_all(text, " ").into_owned()
}

/// Derives a readable title from the final segment of `path`.
pub fn title(path: &str) -> String {
    let (name, _) = split_group(last_segment(path));
    // Versions keep their dots; everything between them is separator-collapsed.
    let mut spaced = String::with_capacity(name.len());
    let mut cursor = 0;
    for version in VERSION_REGEX.captures_iter(name).filter_map(|captures| captures.get(1)) {
        spaced.push_str(&collapse(&name[cursor..version.start()]));
        spaced.push(' ');
        spaced.push_str(version.as_str());
        spaced.push(' ');
        cursor = version.end();
    }
    spaced.push_str(&collapse(&name[cursor..]));

    spaced
        .split_whitespace()
        .map(|word| {
            ABBREVIATIONS
                .iter()
                .find(|(short, _)| word.eq_ignore_ascii_case(short))
                .map(|(_, long)| *long)
                .unwrap_or(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}
