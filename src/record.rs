//! Incident record types.
//!
//! `IncidentRecord` is the single output of an extraction call. Temporal fields
//! are stored as calendar values; `day_of_week` is always derived from `date`
//! so the two can never disagree.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of incident categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentType {
    Corner,
    Pavement,
}

impl IncidentType {
    /// Parse a recognized label. Anything outside the enumeration is `None`.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "corner" => Some(Self::Corner),
            "pavement" => Some(Self::Pavement),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Corner => "corner",
            Self::Pavement => "pavement",
        }
    }
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which timestamp strategy produced a [`Timestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampSource {
    Metadata,
    Filename,
}

impl fmt::Display for TimestampSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metadata => f.write_str("metadata"),
            Self::Filename => f.write_str("filename"),
        }
    }
}

/// A machine-written capture time recovered from metadata or the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub at: NaiveDateTime,
    pub source: TimestampSource,
}

impl Timestamp {
    pub fn new(at: NaiveDateTime, source: TimestampSource) -> Self {
        Self { at, source }
    }

    pub fn date(&self) -> NaiveDate {
        self.at.date()
    }

    /// Capture time truncated to the minute.
    pub fn time(&self) -> NaiveTime {
        truncate_to_minute(self.at.time())
    }
}

/// Full English weekday name for a date (e.g. `Thursday`).
pub fn weekday_name(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

pub(crate) fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

/// Structured incident details extracted from one image.
///
/// Every field uses `None` for "not resolved"; there are no placeholder values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(into = "RecordJson")]
pub struct IncidentRecord {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub registration: Option<String>,
    pub colour: Option<String>,
    pub incident_type: Option<IncidentType>,
}

impl IncidentRecord {
    /// Weekday of `date`; absent iff `date` is absent.
    pub fn day_of_week(&self) -> Option<String> {
        self.date.map(weekday_name)
    }

    /// `YYYY-MM-DD`
    pub fn date_string(&self) -> Option<String> {
        self.date.map(|d| d.format("%Y-%m-%d").to_string())
    }

    /// `HH:MM`, 24-hour.
    pub fn time_string(&self) -> Option<String> {
        self.time.map(|t| t.format("%H:%M").to_string())
    }

    /// Combine the timestamp cascade with the text-derived fields.
    ///
    /// A timestamp, when present, owns `date` and `time` together. Registration,
    /// colour and incident type only ever come from text.
    pub fn merge(timestamp: Option<&Timestamp>, text: IncidentRecord) -> IncidentRecord {
        let (date, time) = match timestamp {
            Some(ts) => (Some(ts.date()), Some(ts.time())),
            None => (text.date, text.time.map(truncate_to_minute)),
        };

        IncidentRecord {
            date,
            time,
            registration: text
                .registration
                .map(|r| r.split_whitespace().collect::<String>().to_uppercase())
                .filter(|r| !r.is_empty()),
            colour: text
                .colour
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty()),
            incident_type: text.incident_type,
        }
    }
}

/// Wire shape of [`IncidentRecord`].
#[derive(Serialize)]
struct RecordJson {
    date: Option<String>,
    time: Option<String>,
    day_of_week: Option<String>,
    registration: Option<String>,
    colour: Option<String>,
    incident_type: Option<IncidentType>,
}

impl From<IncidentRecord> for RecordJson {
    fn from(record: IncidentRecord) -> Self {
        Self {
            date: record.date_string(),
            time: record.time_string(),
            day_of_week: record.day_of_week(),
            registration: record.registration,
            colour: record.colour,
            incident_type: record.incident_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekday_across_leap_day() {
        assert_eq!(weekday_name(ymd(2024, 2, 28)), "Wednesday");
        assert_eq!(weekday_name(ymd(2024, 2, 29)), "Thursday");
        assert_eq!(weekday_name(ymd(2024, 3, 1)), "Friday");
        assert_eq!(weekday_name(ymd(2026, 2, 3)), "Tuesday");
    }

    #[test]
    fn test_day_of_week_follows_date() {
        let mut record = IncidentRecord::default();
        assert_eq!(record.day_of_week(), None);

        record.date = Some(ymd(2024, 2, 29));
        assert_eq!(record.day_of_week().as_deref(), Some("Thursday"));
    }

    #[test]
    fn test_incident_type_closed_set() {
        assert_eq!(IncidentType::from_label("Corner"), Some(IncidentType::Corner));
        assert_eq!(IncidentType::from_label(" PAVEMENT "), Some(IncidentType::Pavement));
        assert_eq!(IncidentType::from_label("diagonal"), None);
        assert_eq!(IncidentType::from_label(""), None);
    }

    #[test]
    fn test_merge_prefers_timestamp() {
        let at = ymd(2026, 1, 1).and_hms_opt(8, 15, 42).unwrap();
        let ts = Timestamp::new(at, TimestampSource::Metadata);
        let text = IncidentRecord {
            date: Some(ymd(2025, 12, 31)),
            time: NaiveTime::from_hms_opt(23, 59, 0),
            registration: Some("ab12 cde".to_string()),
            colour: Some("Silver".to_string()),
            incident_type: Some(IncidentType::Pavement),
        };

        let merged = IncidentRecord::merge(Some(&ts), text);
        assert_eq!(merged.date_string().as_deref(), Some("2026-01-01"));
        assert_eq!(merged.time_string().as_deref(), Some("08:15"));
        assert_eq!(merged.day_of_week().as_deref(), Some("Thursday"));
        assert_eq!(merged.registration.as_deref(), Some("AB12CDE"));
        assert_eq!(merged.colour.as_deref(), Some("silver"));
        assert_eq!(merged.incident_type, Some(IncidentType::Pavement));
    }

    #[test]
    fn test_merge_falls_back_to_text() {
        let text = IncidentRecord {
            date: Some(ymd(2025, 12, 31)),
            time: NaiveTime::from_hms_opt(7, 5, 0),
            ..Default::default()
        };
        let merged = IncidentRecord::merge(None, text);
        assert_eq!(merged.date_string().as_deref(), Some("2025-12-31"));
        assert_eq!(merged.time_string().as_deref(), Some("07:05"));
        assert_eq!(merged.day_of_week().as_deref(), Some("Wednesday"));
        assert_eq!(merged.registration, None);
    }

    #[test]
    fn test_json_shape() {
        let record = IncidentRecord {
            date: Some(ymd(2026, 2, 3)),
            time: NaiveTime::from_hms_opt(15, 27, 0),
            registration: Some("AB12CDE".to_string()),
            colour: None,
            incident_type: Some(IncidentType::Corner),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "date": "2026-02-03",
                "time": "15:27",
                "day_of_week": "Tuesday",
                "registration": "AB12CDE",
                "colour": null,
                "incident_type": "corner"
            })
        );
    }
}
