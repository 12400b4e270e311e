//! Field extraction from recognized text.
//!
//! Pure functions, no async. Each field owns an ordered pattern table; the
//! first pattern that matches anywhere in the text decides the field. For
//! dates and times a match that is not a real calendar date or clock time is
//! skipped and the next pattern gets its turn. Fields are parsed independently
//! against the whole text, so the order of labels in the source is irrelevant.
//!
//! Input is either the labelled answer of the vision model
//! (`DATE: ...`, `COLOUR: ...`) or free OCR prose; the labelled patterns come
//! first in every table so the structured answer wins when both forms occur.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Match, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::record::{IncidentRecord, IncidentType};

/// How to read an ambiguous all-numeric `NN/NN/YYYY` date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `03/02/2026` is 3 February (UK).
    DayFirst,
    /// `03/02/2026` is 2 March (US).
    MonthFirst,
}

/// Regional default for ambiguous numeric dates.
pub const DEFAULT_DATE_ORDER: DateOrder = DateOrder::DayFirst;

impl Default for DateOrder {
    fn default() -> Self {
        DEFAULT_DATE_ORDER
    }
}

/// Marker the vision model uses for fields it cannot read.
const NOT_VISIBLE: &str = "NOT VISIBLE";

/// An ordered list of case-insensitive patterns for one field.
/// Capture group 1 holds the value.
pub struct PatternList {
    field: &'static str,
    patterns: Vec<Regex>,
}

impl PatternList {
    /// Compile patterns in order. Invalid patterns are skipped with a warning.
    fn compile(field: &'static str, sources: &[&str]) -> Self {
        let mut patterns = Vec::new();
        for source in sources {
            match Regex::new(&format!("(?i){}", source)) {
                Ok(regex) => patterns.push(regex),
                Err(e) => warn!("Skipping invalid {} pattern '{}': {}", field, source, e),
            }
        }
        Self { field, patterns }
    }

    /// Every pattern that matches, in table order, with its captured value.
    pub fn matches<'a, 't>(&'a self, text: &'t str) -> impl Iterator<Item = (usize, Match<'t>)> + 'a
    where
        't: 'a,
    {
        self.patterns.iter().enumerate().filter_map(move |(idx, regex)| {
            let value = regex.captures(text)?.get(1)?;
            debug!("{}: pattern {} matched {:?}", self.field, idx, value.as_str());
            Some((idx, value))
        })
    }

    /// Index of the first pattern that matches, with its captured value.
    pub fn first_match<'t>(&self, text: &'t str) -> Option<(usize, Match<'t>)> {
        self.matches(text).next()
    }

    /// First value in table order that `parse` accepts. A match that does not
    /// parse is skipped like a pattern that did not match.
    fn first_parsed<T>(&self, text: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        self.matches(text).find_map(|(idx, value)| {
            let parsed = parse(value.as_str());
            if parsed.is_none() {
                debug!("{}: pattern {} value {:?} is malformed", self.field, idx, value.as_str());
            }
            parsed
        })
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.patterns.len()
    }
}

pub static DATE_PATTERNS: Lazy<PatternList> = Lazy::new(|| {
    PatternList::compile(
        "date",
        &[
            r"DATE[:\s]+([0-9]{4}[-/][0-9]{2}[-/][0-9]{2})",
            r"DATE[:\s]+([0-9]{2}[-/][0-9]{2}[-/][0-9]{4})",
            r"([0-9]{4}[-/][0-9]{2}[-/][0-9]{2})",
            r"([0-9]{2}[-/][0-9]{2}[-/][0-9]{4})",
        ],
    )
});

pub static TIME_PATTERNS: Lazy<PatternList> = Lazy::new(|| {
    PatternList::compile(
        "time",
        &[
            r"TIME[:\s]+([0-9]{1,2}:[0-9]{2}(?::[0-9]{2})?)",
            r"([0-9]{1,2}:[0-9]{2}:[0-9]{2})",
            r"([0-9]{1,2}:[0-9]{2})",
        ],
    )
});

pub static REGISTRATION_PATTERNS: Lazy<PatternList> = Lazy::new(|| {
    PatternList::compile(
        "registration",
        &[
            // Current UK format: AB12 CDE
            r"REGISTRATION[:\s]+([A-Z]{2}[0-9]{2}\s?[A-Z]{3})",
            r"\b([A-Z]{2}[0-9]{2}\s?[A-Z]{3})\b",
            // Prefix format: A123 BCD
            r"\b([A-Z][0-9]{1,3}\s?[A-Z]{3})\b",
        ],
    )
});

pub static COLOUR_PATTERNS: Lazy<PatternList> = Lazy::new(|| {
    PatternList::compile("colour", &[r"COLOU?R[:\s]+([A-Z][A-Z \t]*)"])
});

pub static INCIDENT_TYPE_PATTERNS: Lazy<PatternList> = Lazy::new(|| {
    PatternList::compile("incident_type", &[r"INCIDENT[_\s]TYPE[:\s]+([A-Z]+)"])
});

/// Start of the next `label:` token directly after a captured run of letters.
static LABEL_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w*:").unwrap());

/// Parses the five incident fields out of one text blob.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldParser {
    date_order: DateOrder,
}

impl FieldParser {
    pub fn new(date_order: DateOrder) -> Self {
        Self { date_order }
    }

    /// Never fails; unresolved fields are `None`.
    pub fn parse(&self, text: &str) -> IncidentRecord {
        IncidentRecord {
            date: self.date(text),
            time: time(text),
            registration: registration(text),
            colour: colour(text),
            incident_type: incident_type(text),
        }
    }

    pub fn date(&self, text: &str) -> Option<NaiveDate> {
        DATE_PATTERNS.first_parsed(text, |raw| parse_date(raw, self.date_order))
    }
}

/// Clock time, seconds dropped.
pub fn time(text: &str) -> Option<NaiveTime> {
    TIME_PATTERNS.first_parsed(text, parse_time)
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let mut parts = raw.split(':');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = parts.next()?.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Plate with whitespace removed, case as written.
pub fn registration(text: &str) -> Option<String> {
    let (_, value) = REGISTRATION_PATTERNS.first_match(text)?;
    Some(value.as_str().split_whitespace().collect())
}

/// Lower-cased colour phrase; `NOT VISIBLE` is treated as absent.
pub fn colour(text: &str) -> Option<String> {
    let (_, value) = COLOUR_PATTERNS.first_match(text)?;
    let raw = trim_trailing_label(value.as_str(), &text[value.end()..]).trim();

    if raw.is_empty() || raw.to_uppercase().contains(NOT_VISIBLE) {
        return None;
    }
    Some(raw.to_lowercase())
}

/// Only `corner` or `pavement`; any other labelled value is discarded.
pub fn incident_type(text: &str) -> Option<IncidentType> {
    let (_, value) = INCIDENT_TYPE_PATTERNS.first_match(text)?;
    let parsed = IncidentType::from_label(value.as_str());
    if parsed.is_none() {
        debug!("incident_type: discarding {:?}", value.as_str());
    }
    parsed
}

/// Drop a trailing word that is really the start of the next `label:` token,
/// e.g. `Silver INCIDENT` followed by `_TYPE: corner`.
fn trim_trailing_label<'a>(value: &'a str, rest: &str) -> &'a str {
    if !value.ends_with(|c: char| c.is_ascii_alphabetic()) || !LABEL_TAIL.is_match(rest) {
        return value;
    }
    match value.rfind([' ', '\t']) {
        Some(idx) => &value[..idx],
        None => "",
    }
}

/// Parse `YYYY-MM-DD` / `YYYY/MM/DD` or `NN-NN-YYYY` / `NN/NN/YYYY`.
///
/// Year-first dates are always year-month-day. For the ambiguous form the
/// configured order is tried first and the swapped reading second.
pub fn parse_date(raw: &str, order: DateOrder) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.split(['-', '/']).collect();
    let [a, b, c] = parts.as_slice() else {
        return None;
    };

    if a.len() == 4 {
        return NaiveDate::from_ymd_opt(a.parse().ok()?, b.parse().ok()?, c.parse().ok()?);
    }

    let year: i32 = c.parse().ok()?;
    let first: u32 = a.parse().ok()?;
    let second: u32 = b.parse().ok()?;
    let (day, month) = match order {
        DateOrder::DayFirst => (first, second),
        DateOrder::MonthFirst => (second, first),
    };

    NaiveDate::from_ymd_opt(year, month, day).or_else(|| NaiveDate::from_ymd_opt(year, day, month))
}
