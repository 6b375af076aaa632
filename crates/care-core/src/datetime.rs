//! Lenient date/time parsing for values that arrive as free text (workflow
//! parameters, stored filter preferences, date custom fields).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const DATE_TIME_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M",
  "%m/%d/%Y %H:%M:%S",
  "%m/%d/%Y %H:%M",
  "%m/%d/%Y %I:%M:%S %p",
  "%m/%d/%Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parse `s` as a point in time.
///
/// Accepts RFC 3339, ISO-like and US-style date/times, and bare dates (taken
/// as midnight UTC). Values without an offset are read as UTC. Returns `None`
/// for empty or unparseable input.
pub fn parse_date_time(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }

  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }

  for fmt in DATE_TIME_FORMATS {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
      return Some(naive.and_utc());
    }
  }

  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}
