//! UTC timestamp helpers.
//!
//! Persisted `created`/`updated` columns use the fixed format
//! `YYYY-MM-DD HH:MM:SS` with no offset; every value is UTC.
//!
//! ```
//! use resource_store_core::time;
//!
//! let date = time::time_to_date(86_400).unwrap();
//! assert_eq!(date, "1970-01-02 00:00:00");
//! assert_eq!(time::date_to_time(&date).unwrap(), 86_400);
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{CoreError, Result};

/// `strftime` pattern for stored datetimes.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time as a datetime string.
pub fn now() -> String {
    Utc::now().format(DATETIME_FORMAT).to_string()
}

/// Formats Unix epoch seconds as a UTC datetime string.
pub fn time_to_date(epoch: i64) -> Result<String> {
    DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.format(DATETIME_FORMAT).to_string())
        .ok_or(CoreError::InvalidTimestamp(epoch))
}

/// Parses a UTC datetime string into Unix epoch seconds.
pub fn date_to_time(date: &str) -> Result<i64> {
    NaiveDateTime::parse_from_str(date.trim(), DATETIME_FORMAT)
        .map(|naive| naive.and_utc().timestamp())
        .map_err(|_| CoreError::InvalidDate(date.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_zero() {
        assert_eq!(time_to_date(0).unwrap(), "1970-01-01 00:00:00");
        assert_eq!(date_to_time("1970-01-01 00:00:00").unwrap(), 0);
    }

    #[test]
    fn test_round_trip() {
        for t in [0, 1, 59, 951_782_400, 1_700_000_000, 4_102_444_799, -86_401] {
            assert_eq!(date_to_time(&time_to_date(t).unwrap()).unwrap(), t);
        }
    }

    #[test]
    fn test_leap_day() {
        assert_eq!(time_to_date(951_782_400).unwrap(), "2000-02-29 00:00:00");
    }

    #[test]
    fn test_now_is_parseable() {
        let stamp = now();
        assert_eq!(stamp.len(), 19);
        let secs = date_to_time(&stamp).unwrap();
        assert!((Utc::now().timestamp() - secs).abs() < 5);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(date_to_time("2024-13-01 00:00:00"), Err(CoreError::InvalidDate(_))));
        assert!(matches!(date_to_time("yesterday"), Err(CoreError::InvalidDate(_))));
        assert!(matches!(time_to_date(i64::MAX), Err(CoreError::InvalidTimestamp(_))));
    }
}
