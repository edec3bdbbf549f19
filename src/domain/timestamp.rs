//! Date-time parsing shared by every write path.
//!
//! Accepts a bare date (midnight), a date-time separated by `T` or a space
//! with optional seconds and fraction, or RFC 3339 with an offset or `Z`,
//! which is normalized to UTC. Bars are keyed by the resulting naive value.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, de};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .ok()
        .map(|dt| dt.naive_utc())
}

fn invalid<E: de::Error>(raw: &str) -> E {
    E::custom(format!("invalid date-time '{raw}'"))
}

/// `deserialize_with` target for a single date-time field.
pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw).ok_or_else(|| invalid(&raw))
}

/// `deserialize_with` target for a list of date-times.
pub fn deserialize_all<'de, D>(deserializer: D) -> Result<Vec<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<String>::deserialize(deserializer)?
        .iter()
        .map(|raw| parse_datetime(raw).ok_or_else(|| invalid(raw)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn accepted_forms() {
        assert_eq!(parse_datetime("2025-01-02"), Some(dt(2025, 1, 2, 0, 0, 0)));
        assert_eq!(
            parse_datetime("2025-01-02T09:15:30"),
            Some(dt(2025, 1, 2, 9, 15, 30))
        );
        assert_eq!(
            parse_datetime("2025-01-02 09:15:30"),
            Some(dt(2025, 1, 2, 9, 15, 30))
        );
        assert_eq!(
            parse_datetime("2025-01-02 09:15"),
            Some(dt(2025, 1, 2, 9, 15, 0))
        );
        assert_eq!(
            parse_datetime("2025-01-02T09:15:00Z"),
            Some(dt(2025, 1, 2, 9, 15, 0))
        );
        assert_eq!(
            parse_datetime("2025-01-02T09:15:00+05:30"),
            Some(dt(2025, 1, 2, 3, 45, 0))
        );
        assert_eq!(
            parse_datetime("2025-01-02 09:15:00+05:30"),
            Some(dt(2025, 1, 2, 3, 45, 0))
        );
    }

    #[test]
    fn rejected_forms() {
        assert_eq!(parse_datetime("02/01/2025"), None);
        assert_eq!(parse_datetime("datetime"), None);
        assert_eq!(parse_datetime(""), None);
        assert_eq!(parse_datetime("2025-13-01"), None);
    }

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        #[serde(deserialize_with = "deserialize")]
        at: NaiveDateTime,
        #[serde(deserialize_with = "deserialize_all")]
        series: Vec<NaiveDateTime>,
    }

    #[test]
    fn serde_uses_the_same_rules() {
        let w: Wrapper = serde_json::from_str(
            r#"{"at": "2014-01-24 00:00:00", "series": ["2014-01-24", "2014-01-24T01:00:00Z"]}"#,
        )
        .unwrap();
        assert_eq!(w.at, dt(2014, 1, 24, 0, 0, 0));
        assert_eq!(w.series, vec![dt(2014, 1, 24, 0, 0, 0), dt(2014, 1, 24, 1, 0, 0)]);

        let err = serde_json::from_str::<Wrapper>(r#"{"at": "yesterday", "series": []}"#)
            .unwrap_err();
        assert!(err.to_string().contains("invalid date-time 'yesterday'"));
    }
}
