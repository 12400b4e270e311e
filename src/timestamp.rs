//! Capture-time recovery from image metadata and file names.
//!
//! Strategies run in a fixed order and the first one that yields a timestamp
//! wins; later strategies are not consulted. "Not found" is `None`, never an
//! error: unreadable files, missing tags and malformed values all degrade to
//! the next strategy.

use chrono::NaiveDateTime;
use exif::{In, Tag, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

use crate::record::{Timestamp, TimestampSource};

/// One self-contained way of recovering a capture time.
pub trait TimestampStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn extract(&self, image: &Path) -> Option<Timestamp>;
}

/// Metadata first, then file name.
pub fn default_strategies() -> Vec<Box<dyn TimestampStrategy>> {
    vec![Box::new(ExifTimestamp), Box::new(FilenameTimestamp)]
}

/// Run strategies in order, stopping at the first hit.
pub fn first_timestamp(
    strategies: &[Box<dyn TimestampStrategy>],
    image: &Path,
) -> Option<Timestamp> {
    for strategy in strategies {
        if let Some(ts) = strategy.extract(image) {
            info!(
                "Using {} timestamp: {} ({})",
                ts.source,
                ts.at,
                strategy.name()
            );
            return Some(ts);
        }
        debug!("{}: no timestamp", strategy.name());
    }
    None
}

// ── EXIF ────────────────────────────────────────────────────────────────────

/// Tags consulted, in order.
const EXIF_TAGS: [Tag; 3] = [Tag::DateTime, Tag::DateTimeOriginal, Tag::DateTimeDigitized];

/// `YYYY:MM:DD HH:MM:SS`
const EXIF_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Reads the capture time from embedded EXIF metadata.
pub struct ExifTimestamp;

impl TimestampStrategy for ExifTimestamp {
    fn name(&self) -> &str {
        "exif"
    }

    fn extract(&self, image: &Path) -> Option<Timestamp> {
        let exif = match read_exif(image) {
            Ok(exif) => exif,
            Err(e) => {
                debug!("ExifTimestamp: no metadata in {}: {}", image.display(), e);
                return None;
            }
        };

        for tag in EXIF_TAGS {
            let Some(field) = exif.get_field(tag, In::PRIMARY) else {
                continue;
            };
            let Some(raw) = ascii_value(&field.value) else {
                continue;
            };
            debug!("ExifTimestamp: found {} = {:?}", tag, raw);

            match parse_exif_datetime(&raw) {
                Some(at) => return Some(Timestamp::new(at, TimestampSource::Metadata)),
                None => debug!("ExifTimestamp: could not parse {} value {:?}", tag, raw),
            }
        }

        None
    }
}

fn read_exif(image: &Path) -> anyhow::Result<exif::Exif> {
    let file = File::open(image)?;
    let mut reader = BufReader::new(file);
    Ok(exif::Reader::new().read_from_container(&mut reader)?)
}

fn ascii_value(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => parts
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim_end_matches('\0'), EXIF_FORMAT).ok()
}

// ── File name ───────────────────────────────────────────────────────────────

/// `YYYYMMDD` then `HHMMSS`, optionally separated (e.g. `PXL_20260203_152754898.jpg`).
static FILENAME_STAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{8})[_\-T ]?([0-9]{6})").unwrap());

/// Reads the capture time from a camera-style file name.
pub struct FilenameTimestamp;

impl TimestampStrategy for FilenameTimestamp {
    fn name(&self) -> &str {
        "filename"
    }

    fn extract(&self, image: &Path) -> Option<Timestamp> {
        let filename = image.file_name()?.to_string_lossy();
        let captures = FILENAME_STAMP.captures(&filename)?;
        let stamp = format!("{}{}", &captures[1], &captures[2]);

        match NaiveDateTime::parse_from_str(&stamp, "%Y%m%d%H%M%S") {
            Ok(at) => Some(Timestamp::new(at, TimestampSource::Filename)),
            Err(e) => {
                debug!("FilenameTimestamp: {} is not a valid timestamp: {}", stamp, e);
                None
            }
        }
    }
}
