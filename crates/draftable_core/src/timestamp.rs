//! Canonical publish timestamp representation and lenient parsing.
//!
//! # Responsibility
//! - Define the single timestamp type stored in `published_at`.
//! - Normalize caller input (typed timestamps or text) before assignment.
//!
//! # Invariants
//! - Canonical timestamps are UTC with whole-millisecond precision, matching
//!   the INTEGER epoch-ms storage column.
//! - Invalid text never degrades to `None`; it fails with `TimestampParseError`.

use crate::clock::Clock;
use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, SubsecRound, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Canonical publish timestamp.
pub type Timestamp = DateTime<Utc>;

static RELATIVE_OFFSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<sign>[+-])?\s*(?P<amount>\d+)\s*(?P<unit>second|minute|hour|day|week)s?(?P<ago>\s+ago)?$")
        .expect("relative offset pattern is valid")
});

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Error raised when text cannot be read as a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampParseError {
    input: String,
}

impl TimestampParseError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }

    /// Returns the rejected input as given by the caller.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl Display for TimestampParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "could not parse `{}` as a timestamp", self.input)
    }
}

impl Error for TimestampParseError {}

/// Value accepted by `set_published_at` style operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishedAtInput {
    /// Clears the timestamp (unpublish).
    Null,
    /// Already-typed timestamp; only normalized.
    At(Timestamp),
    /// Free-form text parsed by [`parse_timestamp`].
    Text(String),
}

impl PublishedAtInput {
    /// Resolves the input into an optional canonical timestamp.
    ///
    /// Keywords and relative offsets are resolved against `clock`.
    pub fn resolve(&self, clock: &dyn Clock) -> Result<Option<Timestamp>, TimestampParseError> {
        match self {
            Self::Null => Ok(None),
            Self::At(at) => Ok(Some(normalize(*at))),
            Self::Text(text) => parse_timestamp(text, clock).map(Some),
        }
    }
}

impl From<Timestamp> for PublishedAtInput {
    fn from(value: Timestamp) -> Self {
        Self::At(value)
    }
}

impl From<Option<Timestamp>> for PublishedAtInput {
    fn from(value: Option<Timestamp>) -> Self {
        value.map_or(Self::Null, Self::At)
    }
}

impl From<&str> for PublishedAtInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PublishedAtInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Option<&str>> for PublishedAtInput {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::Null, Self::from)
    }
}

/// Truncates a timestamp to the millisecond storage precision.
pub fn normalize(at: Timestamp) -> Timestamp {
    at.trunc_subsecs(3)
}

/// Converts a canonical timestamp into its stored epoch-ms value.
pub fn to_epoch_ms(at: Timestamp) -> i64 {
    at.timestamp_millis()
}

/// Reads a stored epoch-ms value; `None` when out of the representable range.
pub fn from_epoch_ms(ms: i64) -> Option<Timestamp> {
    DateTime::<Utc>::from_timestamp_millis(ms)
}

/// Parses free-form timestamp text.
///
/// Accepted shapes, tried in order:
/// - keywords `now`, `today`, `tomorrow`, `yesterday`;
/// - relative offsets such as `+1 hour`, `-2 days`, `3 weeks ago`;
/// - RFC 3339 (`2020-01-01T10:00:00+02:00`);
/// - naive date-time (`2020-01-01 10:00:00`), read as UTC;
/// - bare date (`2020-01-01`), read as midnight UTC.
///
/// # Errors
/// - Returns `TimestampParseError` for empty or unrecognized input.
pub fn parse_timestamp(input: &str, clock: &dyn Clock) -> Result<Timestamp, TimestampParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimestampParseError::new(input));
    }

    let lowered = trimmed.to_ascii_lowercase();
    if let Some(at) = parse_keyword(&lowered, clock) {
        return Ok(normalize(at));
    }
    if let Some(offset) = parse_relative_offset(&lowered) {
        return clock
            .now()
            .checked_add_signed(offset)
            .map(normalize)
            .ok_or_else(|| TimestampParseError::new(input));
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(normalize(at.with_timezone(&Utc)));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(normalize(at.and_utc()));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        if let Some(at) = date.and_hms_opt(0, 0, 0) {
            return Ok(at.and_utc());
        }
    }

    Err(TimestampParseError::new(input))
}

fn parse_keyword(lowered: &str, clock: &dyn Clock) -> Option<Timestamp> {
    let now = clock.now();
    let midnight = now.date_naive().and_hms_opt(0, 0, 0)?.and_utc();
    match lowered {
        "now" => Some(now),
        "today" => Some(midnight),
        "tomorrow" => midnight.checked_add_days(Days::new(1)),
        "yesterday" => midnight.checked_sub_days(Days::new(1)),
        _ => None,
    }
}

fn parse_relative_offset(lowered: &str) -> Option<Duration> {
    let captures = RELATIVE_OFFSET.captures(lowered)?;
    let sign = captures.name("sign").map(|m| m.as_str());
    let ago = captures.name("ago").is_some();
    if sign.is_some() && ago {
        return None;
    }

    let amount: i64 = captures.name("amount")?.as_str().parse().ok()?;
    let magnitude = match captures.name("unit")?.as_str() {
        "second" => Duration::try_seconds(amount)?,
        "minute" => Duration::try_minutes(amount)?,
        "hour" => Duration::try_hours(amount)?,
        "day" => Duration::try_days(amount)?,
        "week" => Duration::try_weeks(amount)?,
        _ => return None,
    };

    if ago || sign == Some("-") {
        Some(-magnitude)
    } else {
        Some(magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::{from_epoch_ms, normalize, parse_timestamp, to_epoch_ms, PublishedAtInput};
    use crate::clock::FixedClock;
    use chrono::{Duration, TimeZone, Utc};

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 15, 30, 0).unwrap())
    }

    #[test]
    fn parses_bare_date_as_utc_midnight() {
        let parsed = parse_timestamp("2020-01-01", &clock()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_rfc3339_with_offset_into_utc() {
        let parsed = parse_timestamp("2020-01-01T10:00:00+02:00", &clock()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2020, 1, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn parses_naive_datetime_with_and_without_fraction() {
        let plain = parse_timestamp("2021-06-15 08:45:10", &clock()).unwrap();
        assert_eq!(plain, Utc.with_ymd_and_hms(2021, 6, 15, 8, 45, 10).unwrap());

        let fractional = parse_timestamp("2021-06-15T08:45:10.123456", &clock()).unwrap();
        assert_eq!(to_epoch_ms(fractional) - to_epoch_ms(plain), 123);
    }

    #[test]
    fn parses_keywords_against_clock() {
        let clock = clock();
        assert_eq!(
            parse_timestamp(" NOW ", &clock).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 10, 15, 30, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("tomorrow", &clock).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("yesterday", &clock).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn parses_relative_offsets() {
        let clock = clock();
        let base = Utc.with_ymd_and_hms(2024, 3, 10, 15, 30, 0).unwrap();
        assert_eq!(
            parse_timestamp("+1 hour", &clock).unwrap(),
            base + Duration::hours(1)
        );
        assert_eq!(
            parse_timestamp("2 days ago", &clock).unwrap(),
            base - Duration::days(2)
        );
        assert_eq!(
            parse_timestamp("-3 weeks", &clock).unwrap(),
            base - Duration::weeks(3)
        );
        assert!(parse_timestamp("+2 days ago", &clock).is_err());
    }

    #[test]
    fn out_of_range_offsets_are_errors() {
        let clock = clock();
        let err = parse_timestamp("+999999999 weeks", &clock).unwrap_err();
        assert_eq!(err.input(), "+999999999 weeks");
        assert!(parse_timestamp("999999999 weeks ago", &clock).is_err());
        assert!(parse_timestamp("+99999999999999999999 days", &clock).is_err());
    }

    #[test]
    fn rejects_garbage_and_empty_input() {
        let err = parse_timestamp("not a date", &clock()).unwrap_err();
        assert_eq!(err.input(), "not a date");
        assert!(err.to_string().contains("not a date"));
        assert!(parse_timestamp("   ", &clock()).is_err());
        assert!(parse_timestamp("2020-13-45", &clock()).is_err());
    }

    #[test]
    fn null_input_resolves_to_none() {
        assert_eq!(PublishedAtInput::Null.resolve(&clock()).unwrap(), None);
        assert_eq!(
            PublishedAtInput::from(None::<&str>).resolve(&clock()).unwrap(),
            None
        );
    }

    #[test]
    fn normalize_truncates_to_millis_and_survives_storage() {
        let precise = Utc.timestamp_nanos(1_700_000_000_123_456_789);
        let normalized = normalize(precise);
        assert_eq!(to_epoch_ms(normalized), 1_700_000_000_123);
        assert_eq!(from_epoch_ms(to_epoch_ms(normalized)), Some(normalized));
    }
}
