use crate::error::{ErrorKind, Result};
use crate::{Extracted, MetadataExtractor, consts};
use exn::{OptionExt, ResultExt};
use regex::{Captures, Regex};
use time::{Date, Month};
use tracing::instrument;

/// Two-digit years below this belong to the 2000s, the rest to the 1900s.
pub const CENTURY_PIVOT: i32 = 80;

const MONTH_NAMES: [&str; 12] = ["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];

/// Box-drawing and border characters that frame lines in info files.
fn is_border(c: char) -> bool {
    c.is_whitespace() || matches!(c, '|' | '*' | '#' | '│' | '║' | '░' | '▒' | '▓' | '█')
}

/// An extractor driven by two regular expressions.
///
/// The title expression yields its `title` capture (or the first group); the
/// date expression must provide `year`, `month` and `day` captures. Months
/// may be numeric or English names, and two-digit years pivot at
/// [`CENTURY_PIVOT`].
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    title: Option<Regex>,
    date: Option<Regex>,
}
impl PatternExtractor {
    /// # Errors
    /// [`ErrorKind::Pattern`] when either expression does not compile, or the
    /// date expression lacks one of the named captures.
    pub fn new(title: Option<&str>, date: Option<&str>) -> Result<Self> {
        let compile = |pattern: &str| Regex::new(pattern).or_raise(|| ErrorKind::Pattern(pattern.to_string()));
        let title = title.map(compile).transpose()?;
        let date = date.map(compile).transpose()?;
        if let Some(date) = &date
            && !["year", "month", "day"].iter().all(|name| date.capture_names().flatten().any(|n| n == *name))
        {
            exn::bail!(ErrorKind::Pattern(date.as_str().to_string()));
        }
        Ok(Self { title, date })
    }

    /// A grammar for labelled `Title:` and `Date: MM-DD-YY` lines.
    pub fn generic() -> Self {
        Self { title: Some(consts::GENERIC_TITLE_REGEX.clone()), date: Some(consts::GENERIC_DATE_REGEX.clone()) }
    }

    fn title(&self, text: &str) -> Option<String> {
        let captures = self.title.as_ref()?.captures(text)?;
        let matched = captures.name("title").or_else(|| captures.get(1))?;
        let title = matched.as_str().trim_matches(is_border);
        match title.is_empty() {
            true => None,
            false => Some(title.split_whitespace().collect::<Vec<_>>().join(" ")),
        }
    }

    fn date(&self, text: &str) -> Result<Option<Date>> {
        let Some(captures) = self.date.as_ref().and_then(|date| date.captures(text)) else {
            return Ok(None);
        };
        Ok(Some(parse_date(&captures)?))
    }
}
impl MetadataExtractor for PatternExtractor {
    #[instrument(level = "trace", skip_all)]
    fn extract(&self, text: &str) -> Result<Extracted> {
        Ok(Extracted { title: self.title(text), published: self.date(text)? })
    }
}

fn capture<'t>(captures: &Captures<'t>, field: &'static str) -> Result<&'t str> {
    Ok(captures.name(field).ok_or_raise(|| ErrorKind::ParseError { field, value: String::new() })?.as_str())
}

fn parse_date(captures: &Captures<'_>) -> Result<Date> {
    let year = capture(captures, "year")?;
    let month = capture(captures, "month")?;
    let day = capture(captures, "day")?;

    let year = match year.parse::<i32>() {
        Ok(short) if year.len() == 2 && short < CENTURY_PIVOT => 2000 + short,
        Ok(short) if year.len() == 2 => 1900 + short,
        Ok(full) => full,
        Err(_) => exn::bail!(ErrorKind::ParseError { field: "year", value: year.to_string() }),
    };
    let month_number = match month.parse::<u8>() {
        Ok(number) => number,
        Err(_) => {
            let prefix = month.get(..3).map(str::to_lowercase).unwrap_or_default();
            let index = MONTH_NAMES
                .iter()
                .position(|name| *name == prefix)
                .ok_or_raise(|| ErrorKind::ParseError { field: "month", value: month.to_string() })?;
            index as u8 + 1
        },
    };
    let month = Month::try_from(month_number)
        .or_raise(|| ErrorKind::ParseError { field: "month", value: month.to_string() })?;
    let day = day.parse::<u8>().or_raise(|| ErrorKind::ParseError { field: "day", value: day.to_string() })?;
    Date::from_calendar_date(year, month, day)
        .or_raise(|| ErrorKind::ParseError { field: "date", value: format!("{year}-{month_number:02}-{day:02}") })
}
