//! Timestamp parsing for front matter dates.
//!
//! Headers in the wild carry dates in several shapes. All of them normalize to
//! `DateTime<FixedOffset>`; values without an offset are taken as UTC.
//!
//! | Input                          | Result                        |
//! |--------------------------------|-------------------------------|
//! | `2024-03-01T09:30:00+02:00`    | as written                    |
//! | `2024-03-01T09:30:00Z`         | UTC                           |
//! | `2024-03-01T09:30:00`          | UTC                           |
//! | `2024-03-01 09:30:00`          | UTC                           |
//! | `2024-03-01 09:30:00 +0200`    | as written                    |
//! | `2024-03-01`                   | midnight UTC                  |

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M:%S%z"];

/// Parse a header date. Returns `None` when no known format matches or the
/// calendar values are out of range.
pub fn parse_date(input: &str) -> Option<DateTime<FixedOffset>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Serializer for manifest timestamps, in the same RFC 3339 spelling that
/// rendered headers use (`+00:00` rather than `Z`).
pub mod rfc3339 {
    use chrono::{DateTime, FixedOffset};
    use serde::Serializer;

    pub fn serialize<S>(value: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }
}

/// Serde adapter for `Option<DateTime<FixedOffset>>` fields written as strings.
///
/// Serializes as RFC 3339 so a re-parsed header yields the same instant.
pub mod optional {
    use super::parse_date;
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(value: &Option<DateTime<FixedOffset>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => parse_date(&s)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid date: {s:?}"))),
        }
    }
}
