use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Fallback grammar understood by many groups' info files: a labelled title
// line and a labelled numeric date (month first, as DOS-era groups wrote it).
regex!(GENERIC_TITLE_REGEX, r"(?im)^[\s\W]*(?:title|name|program)\s*[:.]+\s*(?P<title>\S.*?)\s*$");
regex!(
    GENERIC_DATE_REGEX,
    r"(?i)(?:date|released?)\s*[:.]+\s*(?P<month>\d{1,2})[-/.](?P<day>\d{1,2})[-/.](?P<year>\d{2}(?:\d{2})?)\b"
);
