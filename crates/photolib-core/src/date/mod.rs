pub mod exif;
pub mod exiftool;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use self::exif::NativeMetadata;
pub use self::exiftool::Exiftool;

/// Separator between year, month and day in a metadata date value.
const DATE_DELIMITER: char = ':';

/// Raw date fields reported for one file, as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataReport {
    /// Embedded creation date, e.g. `2021:05:03 10:11:12`
    pub create_date: Option<String>,
    /// Filesystem modification date, e.g. `2020:01:01 08:00:00+01:00`
    pub modify_date: Option<String>,
}

/// Source of the two date fields for a file.
pub trait MetadataExtractor {
    fn extract(&self, path: &Path) -> Result<MetadataReport>;
}

/// How much a date value is trusted before it becomes directory names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DateParsing {
    /// Use the year/month/day substrings exactly as reported
    #[default]
    Lenient,
    /// Require a real calendar date; anything else leaves the file undated
    Strict,
}

/// Directory layout below the destination root.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum BucketDepth {
    /// `YYYY/MM`
    #[default]
    YearMonth,
    /// `YYYY/MM/DD`
    YearMonthDay,
}

/// Year, month and day as they will appear in the destination path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureDate {
    pub year: String,
    pub month: String,
    pub day: String,
}

impl CaptureDate {
    pub fn bucket(&self, root: &Path, depth: BucketDepth) -> PathBuf {
        let month_dir = root.join(&self.year).join(&self.month);
        match depth {
            BucketDepth::YearMonth => month_dir,
            BucketDepth::YearMonthDay => month_dir.join(&self.day),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateSource {
    Embedded,
    FileModified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateResult {
    pub date: CaptureDate,
    pub source: DateSource,
}

/// Turn a metadata value such as `2021:05:03 10:11:12` into a [`CaptureDate`].
///
/// Lenient mode keeps the substrings verbatim, so `0000:00:00` becomes
/// `0000/00`. Components that are empty or would escape the bucket
/// (separators, `..`) are rejected in both modes.
pub fn parse_date_value(value: &str, parsing: DateParsing) -> Option<CaptureDate> {
    let token = value.split_whitespace().next()?;
    let mut parts = token.split(DATE_DELIMITER);
    let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);

    match parsing {
        DateParsing::Lenient => {
            if [year, month, day].iter().any(|p| !is_safe_component(p)) {
                return None;
            }
            Some(CaptureDate {
                year: year.to_string(),
                month: month.to_string(),
                day: day.to_string(),
            })
        }
        DateParsing::Strict => {
            let date = NaiveDate::from_ymd_opt(
                year.parse().ok()?,
                month.parse().ok()?,
                day.parse().ok()?,
            )?;
            Some(CaptureDate {
                year: date.format("%Y").to_string(),
                month: date.format("%m").to_string(),
                day: date.format("%d").to_string(),
            })
        }
    }
}

fn is_safe_component(part: &str) -> bool {
    !part.is_empty() && part != "." && part != ".." && !part.contains(['/', '\\'])
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Resolve the capture date of `path`.
///
/// Order: embedded creation date, then filesystem modification date unless
/// `embedded_only`. A value that does not parse falls through to the next
/// one. Extractor failures leave the file undated.
pub fn resolve_date(
    extractor: &dyn MetadataExtractor,
    path: &Path,
    parsing: DateParsing,
    embedded_only: bool,
) -> Option<DateResult> {
    let report = match extractor.extract(path) {
        Ok(report) => report,
        Err(e) => {
            warn!("No metadata for {}: {}", path.display(), e);
            return None;
        }
    };

    // 1. Embedded creation date
    if let Some(value) = non_empty(report.create_date.as_deref()) {
        match parse_date_value(value, parsing) {
            Some(date) => {
                return Some(DateResult {
                    date,
                    source: DateSource::Embedded,
                })
            }
            None => debug!("Unusable create date {:?} for {}", value, path.display()),
        }
    }

    if embedded_only {
        return None;
    }

    // 2. Filesystem modification date
    let value = non_empty(report.modify_date.as_deref())?;
    let date = parse_date_value(value, parsing);
    if date.is_none() {
        debug!("Unusable modification date {:?} for {}", value, path.display());
    }
    date.map(|date| DateResult {
        date,
        source: DateSource::FileModified,
    })
}
