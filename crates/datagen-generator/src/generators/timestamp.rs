//! Timestamp value generators.

use chrono::{DateTime, Utc};
use datagen_core::{DateValue, Value};
use rand::Rng;

/// Generate a random timestamp (second resolution) between `min` and `max`.
pub fn generate_timestamp_range<R: Rng>(
    rng: &mut R,
    min: &DateTime<Utc>,
    max: &DateTime<Utc>,
    format: Option<&str>,
) -> Value {
    let start_ts = min.timestamp();
    let end_ts = max.timestamp();

    let dt = if start_ts >= end_ts {
        *min
    } else {
        let random_ts = rng.random_range(start_ts..=end_ts);
        DateTime::from_timestamp(random_ts, 0).unwrap_or(*min)
    };

    Value::Date(DateValue::with_format(dt, format.map(str::to_string)))
}

/// Parse a timestamp string in various formats.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC 3339 / ISO 8601
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Try common date-only format
    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    None
}
