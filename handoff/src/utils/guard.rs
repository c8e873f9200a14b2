//! Argument guards used by validating constructors.
//!
//! Each guard takes the field name and a possibly-absent value and either
//! unwraps it or returns a [`ValidationError`] naming the field.

use super::timestamps::{is_sentinel, Timestamp};
use crate::errors::ValidationError;

/// Fails with [`Violation::Null`](crate::errors::Violation::Null) when `value` is absent.
pub fn against_null<T>(field: &'static str, value: Option<T>) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::null(field))
}

/// Fails when `value` is absent, empty or whitespace-only.
pub fn against_null_and_empty(
    field: &'static str,
    value: Option<String>,
) -> Result<String, ValidationError> {
    let value = against_null(field, value)?;
    if value.trim().is_empty() {
        return Err(ValidationError::empty(field));
    }
    Ok(value)
}

/// Fails when a timestamp is absent or an uninitialised sentinel.
pub fn against_missing_timestamp(
    field: &'static str,
    value: Option<Timestamp>,
) -> Result<Timestamp, ValidationError> {
    match value {
        Some(ts) if !is_sentinel(&ts) => Ok(ts),
        _ => Err(ValidationError::missing(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Violation;
    use crate::utils::timestamps::now;

    #[test]
    fn test_against_null() {
        assert_eq!(against_null("x", Some(3)).unwrap(), 3);

        let err = against_null::<u8>("x", None).unwrap_err();
        assert_eq!(err.field, "x");
        assert_eq!(err.violation, Violation::Null);
    }

    #[test]
    fn test_against_null_and_empty() {
        assert_eq!(
            against_null_and_empty("id", Some("abc".to_string())).unwrap(),
            "abc"
        );
        assert_eq!(
            against_null_and_empty("id", None).unwrap_err().violation,
            Violation::Null
        );
        assert_eq!(
            against_null_and_empty("id", Some(String::new()))
                .unwrap_err()
                .violation,
            Violation::Empty
        );
        assert_eq!(
            against_null_and_empty("id", Some("   ".to_string()))
                .unwrap_err()
                .violation,
            Violation::Empty
        );
    }

    #[test]
    fn test_against_missing_timestamp() {
        let ts = now();
        assert_eq!(against_missing_timestamp("started_at", Some(ts)).unwrap(), ts);

        let err = against_missing_timestamp("started_at", None).unwrap_err();
        assert_eq!(err, ValidationError::missing("started_at"));

        let sentinel: Timestamp = chrono::DateTime::<chrono::Utc>::MAX_UTC.into();
        let err = against_missing_timestamp("completed_at", Some(sentinel)).unwrap_err();
        assert_eq!(err, ValidationError::missing("completed_at"));

        let epoch = Timestamp::default();
        assert_eq!(against_missing_timestamp("started_at", Some(epoch)).unwrap(), epoch);
    }
}
