//! Date input parsing.
//!
//! Dates arrive as ISO `YYYY-MM-DD` from forms and API clients, but some clients echo
//! back human-readable dates ("Oct. 19, 2026", "10/19/2026"). ISO is tried first, then a
//! fixed list of fallback formats.

use crate::errors::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Fallback formats tried in order after ISO; two-digit years before four-digit ones.
const FALLBACK_FORMATS: &[&str] = &[
    "%m/%d/%y",
    "%m/%d/%Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%d %b %Y",
    "%d %b, %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%d %B, %Y",
];

/// Parses a date in ISO form or one of the accepted human-readable forms.
///
/// # Errors
/// Returns [`Error::Validation`] for empty or unrecognized input.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("A date is required"));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    // "Oct. 19, 2026" -> "Oct 19, 2026"
    let normalized = trimmed
        .replace('.', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" ,", ",");

    FALLBACK_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&normalized, format).ok())
        .ok_or_else(|| Error::validation(format!("Unrecognized date: {trimmed}")))
}

/// Today's date in the server's local time zone.
#[must_use]
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Parses an optional date, defaulting to today when absent or blank.
pub fn parse_date_or_today(input: Option<&str>) -> Result<NaiveDate> {
    match input.map(str::trim) {
        Some(value) if !value.is_empty() => parse_date(value),
        _ => Ok(today()),
    }
}

/// Serde adapter accepting any format understood by [`parse_date`].
pub fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

/// Serde adapter for optional dates; blank strings count as absent.
pub fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => parse_date(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}
