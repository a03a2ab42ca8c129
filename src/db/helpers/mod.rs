use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} contains out-of-range value {value}"))
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_uuid(value: &str, field: &str) -> Result<Uuid> {
    Uuid::parse_str(value).with_context(|| format!("failed to parse {field}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{SecondsFormat, TimeZone};

    #[test]
    fn test_to_i64_rejects_overflow() {
        assert_eq!(to_i64(42).unwrap(), 42);
        assert!(to_i64(u64::MAX).is_err());
    }

    #[test]
    fn test_to_u32_rejects_negative() {
        assert_eq!(to_u32(600, "duration_seconds").unwrap(), 600);
        assert!(to_u32(-1, "duration_seconds").is_err());
    }

    #[test]
    fn test_parse_datetime_keeps_subseconds() {
        let original = Utc.timestamp_nanos(1_773_469_800_123_456_789);
        let encoded = original.to_rfc3339_opts(SecondsFormat::Nanos, true);
        assert_eq!(parse_datetime(&encoded, "started_at").unwrap(), original);
        assert!(parse_datetime("yesterday", "started_at").is_err());
    }
}
