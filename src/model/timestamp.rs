use std::cmp::Ordering;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a run timestamp.
///
/// Accepts RFC 3339 (what the reporter writes) and offset-less ISO 8601,
/// which is read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Chronological ordering of raw timestamps.
///
/// Parseable timestamps come first in time order; unparseable ones sort
/// after them. Equal instants fall back to comparing the raw strings.
pub fn chronological(a: &str, b: &str) -> Ordering {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}
