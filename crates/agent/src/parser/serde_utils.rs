use chrono::{DateTime, Utc};
use serde::Serializer;

const UTC_MILLIS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// ISO-8601 in UTC with exactly three fractional digits.
pub fn serialize_utc_millis<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&value.format(UTC_MILLIS_FORMAT))
}
