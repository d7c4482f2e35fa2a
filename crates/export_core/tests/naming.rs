use std::path::Path;

use chrono::{FixedOffset, NaiveDate};
use export_core::{
    created_timestamp, date_prefix, format_timestamp, output_dir_name, parse_date_prefix,
    parse_utc_offset, NamingError, OutputRecord,
};
use pretty_assertions::assert_eq;

#[test]
fn date_prefix_is_anchored_at_start() {
    assert_eq!(date_prefix("2024-01-01-post-a"), Some("2024-01-01"));
    assert_eq!(date_prefix("2024-01-01"), Some("2024-01-01"));
    assert_eq!(date_prefix("draft-notes"), None);
    assert_eq!(date_prefix("notes 2024-01-01"), None);
    assert_eq!(date_prefix("24-01-01-short-year"), None);
    assert_eq!(date_prefix("2024/01/01-slashes"), None);
}

#[test]
fn pattern_match_is_not_date_validation() {
    let prefix = date_prefix("2024-13-45-not-a-date").unwrap();
    assert_eq!(prefix, "2024-13-45");
    assert_eq!(
        parse_date_prefix(prefix),
        Err(NamingError::InvalidDate("2024-13-45".to_string()))
    );
}

#[test]
fn created_timestamp_is_midnight_in_offset() {
    let date = parse_date_prefix("2024-01-01").unwrap();
    let utc = parse_utc_offset("+00:00").unwrap();
    let tokyo = parse_utc_offset("+09:00").unwrap();

    assert_eq!(
        format_timestamp(&created_timestamp(date, utc).unwrap()),
        "2024-01-01T00:00:00+00:00"
    );
    assert_eq!(
        format_timestamp(&created_timestamp(date, tokyo).unwrap()),
        "2024-01-01T00:00:00+09:00"
    );
}

#[test]
fn modified_time_renders_in_offset() {
    let modified = chrono::DateTime::parse_from_rfc3339("2024-01-02T00:00:00Z")
        .unwrap()
        .with_timezone(&FixedOffset::west_opt(3600).unwrap());
    assert_eq!(format_timestamp(&modified), "2024-01-01T23:00:00-01:00");
}

#[test]
fn output_path_is_root_name_index() {
    let root = Path::new("/srv/blog/content");
    let record = OutputRecord::new(root.join(output_dir_name("2024-01-01-post-a")), String::new());
    assert_eq!(
        record.file_path(),
        Path::new("/srv/blog/content/2024-01-01-post-a/index.md")
    );
}

#[test]
fn directory_name_keeps_ordinary_characters() {
    assert_eq!(
        output_dir_name("2024-01-01-Hello, World: part 1"),
        "2024-01-01-Hello, World: part 1"
    );
}

#[test]
fn directory_name_cannot_escape_root() {
    assert_eq!(output_dir_name("2024-01-01-../../etc"), "2024-01-01-.._.._etc");
    assert_eq!(output_dir_name("2024-01-01-a\\b"), "2024-01-01-a_b");
    assert_eq!(output_dir_name("2024-01-01-tab\there"), "2024-01-01-tab_here");
}

#[test]
fn leap_day_prefix_parses() {
    assert_eq!(
        parse_date_prefix("2024-02-29").unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
    );
    assert!(parse_date_prefix("2023-02-29").is_err());
}
