//! Lenient timestamp decoding.
//!
//! The backend emits `LocalDateTime` values without an offset
//! (`2025-01-01T10:00:00`), while cached and realtime JSON carry RFC 3339.
//! Both decode to `DateTime<Utc>`; offset-less values are taken as UTC.
//! Serialization stays RFC 3339.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer};

/// Parse RFC 3339, falling back to an offset-less date-time read as UTC.
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
}

/// Same as [`deserialize`] for optional fields. `null` decodes to `None`.
pub mod option {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::parse(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}"))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn accepts_offset_less_and_rfc3339() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(parse("2025-01-01T10:00:00"), Some(expected));
        assert_eq!(parse("2025-01-01T10:00:00Z"), Some(expected));
        assert_eq!(parse("2025-01-01T12:00:00+02:00"), Some(expected));
        assert_eq!(parse("2025-01-01 10:00:00"), Some(expected));
    }

    #[test]
    fn keeps_fractional_seconds() {
        let parsed = parse("2025-01-01T10:00:00.123456").unwrap();
        assert_eq!(parsed.timestamp_subsec_micros(), 123_456);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse("yesterday"), None);
        assert_eq!(parse("2025-01-01"), None);
    }
}
