use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use regex::Regex;

/// Name of the single file written into each document directory.
pub const INDEX_FILENAME: &str = "index.md";

/// ISO-8601 timestamp with a `+HH:MM` offset, e.g. `2024-01-01T00:00:00+00:00`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

static DATE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}").expect("date prefix pattern is valid")
});

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NamingError {
    #[error("date prefix {0:?} is not a calendar date")]
    InvalidDate(String),
    #[error("invalid utc offset {0:?}, expected Z, +HH:MM or -HH:MM")]
    InvalidOffset(String),
}

/// Returns the `YYYY-MM-DD` prefix of `name` when present.
pub fn date_prefix(name: &str) -> Option<&str> {
    DATE_PREFIX.find(name).map(|m| m.as_str())
}

/// Parses a prefix returned by [`date_prefix`]. The pattern match alone admits
/// strings such as `2024-13-45`, which are rejected here.
pub fn parse_date_prefix(prefix: &str) -> Result<NaiveDate, NamingError> {
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        .map_err(|_| NamingError::InvalidDate(prefix.to_string()))
}

/// Midnight of `date` in `offset`.
pub fn created_timestamp(date: NaiveDate, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    date.and_time(NaiveTime::MIN)
        .and_local_timezone(offset)
        .single()
}

pub fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Accepts `Z`, `+HH:MM`, `-HH:MM`, `+HHMM` and `-HHMM`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, NamingError> {
    let invalid = || NamingError::InvalidOffset(raw.to_string());
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    if !rest.is_ascii() {
        return Err(invalid());
    }
    let (hh, mm) = match rest.len() {
        4 => (&rest[..2], &rest[2..]),
        5 if rest.as_bytes()[2] == b':' => (&rest[..2], &rest[3..]),
        _ => return Err(invalid()),
    };
    if !hh.chars().chain(mm.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = hh.parse().map_err(|_| invalid())?;
    let minutes: i32 = mm.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Directory name for a document. Names are used verbatim except that path
/// separators and control characters become `_`, so a name cannot point
/// outside the output root.
pub fn output_dir_name(name: &str) -> String {
    name.chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect()
}

fn is_forbidden(c: char) -> bool {
    matches!(c, '/' | '\\' | '\0'..='\u{1F}' | '\u{7F}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_with_and_without_colon() {
        assert_eq!(
            parse_utc_offset("+09:00").unwrap(),
            FixedOffset::east_opt(9 * 3600).unwrap()
        );
        assert_eq!(
            parse_utc_offset("-0530").unwrap(),
            FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap()
        );
        assert_eq!(parse_utc_offset("Z").unwrap(), FixedOffset::east_opt(0).unwrap());
    }

    #[test]
    fn malformed_offsets_are_rejected() {
        for raw in ["", "09:00", "+9", "+24:00", "+12:60", "+ab:cd", "+01:00:00"] {
            assert!(parse_utc_offset(raw).is_err(), "accepted {raw:?}");
        }
    }
}
