//! Timestamp utilities for completion windows.
//!
//! Completion records carry timezone-aware instants, so the crate-wide
//! [`Timestamp`] keeps the offset reported by the transport instead of
//! normalising everything to UTC.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone, Utc};
use thiserror::Error;

/// A timezone-aware instant.
pub type Timestamp = DateTime<FixedOffset>;

/// Errors that can occur during timestamp parsing.
#[derive(Debug, Error)]
pub enum TimestampError {
    /// The timestamp string is empty.
    #[error("Empty timestamp string")]
    EmptyString,

    /// The timestamp value is invalid.
    #[error("Invalid timestamp: {0}")]
    InvalidFormat(String),

    /// Nanosecond precision is not supported.
    #[error("Nanosecond precision timestamps are not supported")]
    NanosecondPrecision,
}

/// Detected precision of a Unix timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnixPrecision {
    Seconds,
    Milliseconds,
    Microseconds,
}

impl UnixPrecision {
    const fn units_per_second(self) -> i64 {
        match self {
            Self::Seconds => 1,
            Self::Milliseconds => 1_000,
            Self::Microseconds => 1_000_000,
        }
    }

    /// Splits a count of units into whole seconds and non-negative nanoseconds.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    const fn split(self, units: i64) -> (i64, u32) {
        let per_second = self.units_per_second();
        let nanos = units.rem_euclid(per_second) * (1_000_000_000 / per_second);
        (units.div_euclid(per_second), nanos as u32)
    }
}

/// Returns the current instant with a UTC offset.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now().into()
}

/// Returns true if `ts` is an uninitialised placeholder rather than a real instant.
///
/// Only the representable extremes count as placeholders; the Unix epoch is
/// an ordinary instant.
#[must_use]
pub fn is_sentinel(ts: &Timestamp) -> bool {
    *ts == DateTime::<Utc>::MIN_UTC || *ts == DateTime::<Utc>::MAX_UTC
}

#[allow(clippy::cast_possible_truncation)]
fn detect_unix_precision(timestamp: f64) -> Result<UnixPrecision, TimestampError> {
    let int_part = timestamp.abs().trunc() as i64;
    let digit_count = if int_part == 0 {
        1
    } else {
        int_part.to_string().len()
    };

    match digit_count {
        0..=10 => Ok(UnixPrecision::Seconds),
        11..=13 => Ok(UnixPrecision::Milliseconds),
        14..=16 => Ok(UnixPrecision::Microseconds),
        _ => Err(TimestampError::NanosecondPrecision),
    }
}

/// Parses a transport-reported timestamp.
///
/// Accepts RFC 3339 (offset preserved), RFC 2822 and Unix timestamps in
/// seconds, milliseconds or microseconds. Unix values are returned in UTC.
/// Precision is inferred from the digit count: up to 10 digits are seconds,
/// up to 13 milliseconds, up to 16 microseconds.
pub fn parse_timestamp(input: &str) -> Result<Timestamp, TimestampError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(TimestampError::EmptyString);
    }

    if let Ok(num) = trimmed.parse::<f64>() {
        return parse_unix_timestamp(num);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(dt);
    }

    Err(TimestampError::InvalidFormat(trimmed.to_string()))
}

/// Parses a Unix timestamp with automatic precision detection.
///
/// Values with a fractional part are read as seconds. Negative values are
/// instants before 1970.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_unix_timestamp(value: f64) -> Result<Timestamp, TimestampError> {
    let invalid = || TimestampError::InvalidFormat(value.to_string());

    if !value.is_finite() {
        return Err(invalid());
    }

    let (secs, nanos) = if value.fract().abs() > f64::EPSILON {
        let whole = value.floor();
        let nanos = ((value - whole) * 1_000_000_000.0).round() as u32;
        if nanos >= 1_000_000_000 {
            (whole as i64 + 1, 0)
        } else {
            (whole as i64, nanos)
        }
    } else {
        detect_unix_precision(value)?.split(value as i64)
    };

    Utc.timestamp_opt(secs, nanos)
        .single()
        .map(Into::into)
        .ok_or_else(invalid)
}

/// Formats a timestamp as RFC 3339 with microsecond precision.
#[must_use]
pub fn format_iso8601(dt: &Timestamp) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_detect_unix_precision() {
        assert_eq!(
            detect_unix_precision(1_696_512_000.0).unwrap(),
            UnixPrecision::Seconds
        );
        assert_eq!(
            detect_unix_precision(-1_696_512_000_000.0).unwrap(),
            UnixPrecision::Milliseconds
        );
        assert_eq!(
            detect_unix_precision(1_696_512_000_000_000.0).unwrap(),
            UnixPrecision::Microseconds
        );
        assert!(matches!(
            detect_unix_precision(1_696_512_000_000_000_000.0),
            Err(TimestampError::NanosecondPrecision)
        ));
    }

    #[test]
    fn test_split_keeps_nanos_non_negative() {
        assert_eq!(UnixPrecision::Milliseconds.split(-1500), (-2, 500_000_000));
        assert_eq!(UnixPrecision::Microseconds.split(-1), (-1, 999_999_000));
        assert_eq!(UnixPrecision::Seconds.split(-7), (-7, 0));
    }

    #[test]
    fn test_parse_rfc3339_keeps_offset() {
        let dt = parse_timestamp("2023-10-05T14:30:00+02:00").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(dt.day(), 5);
    }

    #[test]
    fn test_parse_unix_millis() {
        let dt = parse_timestamp("1696512000123").unwrap();
        assert_eq!(dt.year(), 2023);
        assert_eq!(dt.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn test_parse_empty_string() {
        assert!(matches!(parse_timestamp("  "), Err(TimestampError::EmptyString)));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_timestamp("yesterday-ish"),
            Err(TimestampError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_negative_fractional_seconds() {
        let dt = parse_timestamp("-1.5").unwrap();
        assert_eq!(dt.timestamp_millis(), -1500);
    }

    #[test]
    fn test_parse_negative_millis_before_epoch() {
        let dt = parse_timestamp("-1696512000123").unwrap();
        assert_eq!(dt.timestamp_millis(), -1_696_512_000_123);
        assert_eq!(dt.year(), 1916);
    }

    #[test]
    fn test_parse_negative_micros() {
        let dt = parse_timestamp("-1696512000123456").unwrap();
        assert_eq!(dt.timestamp_micros(), -1_696_512_000_123_456);
    }

    #[test]
    fn test_parse_non_finite() {
        assert!(matches!(
            parse_unix_timestamp(f64::NAN),
            Err(TimestampError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_sentinels() {
        assert!(is_sentinel(&DateTime::<Utc>::MIN_UTC.into()));
        assert!(is_sentinel(&DateTime::<Utc>::MAX_UTC.into()));
        assert!(!is_sentinel(&now()));
    }

    #[test]
    fn test_epoch_is_an_ordinary_instant() {
        assert!(!is_sentinel(&Timestamp::default()));
        assert!(!is_sentinel(&parse_timestamp("0").unwrap()));
        assert!(!is_sentinel(&parse_timestamp("1970-01-01T02:00:00+02:00").unwrap()));
    }

    #[test]
    fn test_format_iso8601() {
        let dt = parse_timestamp("2023-10-05T14:30:00.5Z").unwrap();
        assert_eq!(format_iso8601(&dt), "2023-10-05T14:30:00.500000+00:00");
    }
}
