//! MS-DOS date/time fields, as stored by ZIP and RAR.
//!
//! DOS timestamps carry no zone; they are interpreted as UTC throughout so
//! that listing, extraction and repackaging agree with each other.

use filetime::FileTime;
use std::path::Path;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

/// Builds a timestamp from calendar parts, rejecting impossible values.
pub(crate) fn from_parts(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Option<OffsetDateTime> {
    let month = Month::try_from(month).ok()?;
    let date = Date::from_calendar_date(i32::from(year), month, day).ok()?;
    let time = Time::from_hms(hour, minute, second).ok()?;
    Some(PrimitiveDateTime::new(date, time).assume_utc())
}

/// Unpacks a 32-bit DOS timestamp (date in the high word, time in the low word).
#[cfg_attr(not(feature = "rar"), allow(dead_code))]
pub(crate) fn from_packed(packed: u32) -> Option<OffsetDateTime> {
    let date = (packed >> 16) as u16;
    let time = (packed & 0xFFFF) as u16;
    from_parts(
        ((date >> 9) & 0x7F) + 1980,
        ((date >> 5) & 0x0F) as u8,
        (date & 0x1F) as u8,
        (time >> 11) as u8,
        ((time >> 5) & 0x3F) as u8,
        ((time & 0x1F) * 2) as u8,
    )
}

/// Applies a recorded modification time to an extracted file.
pub(crate) fn restore_mtime(path: &Path, modified: Option<OffsetDateTime>) -> std::io::Result<()> {
    match modified {
        Some(modified) => filetime::set_file_mtime(path, FileTime::from_unix_time(modified.unix_timestamp(), 0)),
        None => Ok(()),
    }
}
