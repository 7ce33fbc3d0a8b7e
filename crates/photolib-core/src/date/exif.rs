use chrono::{DateTime, Local, NaiveDateTime};
use exif::{In, Reader, Tag};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use super::{MetadataExtractor, MetadataReport};
use crate::error::Result;

const METADATA_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Metadata read in-process: EXIF tags for the creation date and the
/// filesystem for the modification date. Needs no external program but only
/// understands containers kamadak-exif can parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeMetadata;

impl MetadataExtractor for NativeMetadata {
    fn extract(&self, path: &Path) -> Result<MetadataReport> {
        let modified = fs::metadata(path)?.modified()?;
        let modify_date = DateTime::<Local>::from(modified)
            .format("%Y:%m:%d %H:%M:%S%:z")
            .to_string();

        Ok(MetadataReport {
            create_date: extract_exif_date(path),
            modify_date: Some(modify_date),
        })
    }
}

/// Extract the embedded date from the EXIF block of the file at `path`.
/// EXIF datetimes have no timezone info - they are local time as-is.
pub fn extract_exif_date(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let reader = Reader::new().read_from_container(&mut BufReader::new(file)).ok()?;

    let tags = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime];

    for tag in &tags {
        if let Some(field) = reader.get_field(*tag, In::PRIMARY) {
            let val = field.display_value().to_string();
            if let Some(dt) = parse_exif_datetime(&val) {
                return Some(dt.format(METADATA_FORMAT).to_string());
            }
        }
    }

    None
}

/// kamadak-exif displays `2021-05-03 10:11:12`; cameras write assorted
/// separators. Normalise to colons and require a real datetime.
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let cleaned = s
        .trim()
        .replace('-', ":")
        .replace('/', ":")
        .replace('\\', ":")
        .replace('.', ":");

    if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, METADATA_FORMAT) {
        return Some(dt);
    }

    let date = chrono::NaiveDate::parse_from_str(cleaned.split(' ').next()?, "%Y:%m:%d").ok()?;
    date.and_hms_opt(0, 0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::{parse_date_value, DateParsing};
    use tempfile::tempdir;

    #[test]
    fn test_parse_exif_datetime_separators() {
        let expected = NaiveDateTime::parse_from_str("2021:05:03 10:11:12", METADATA_FORMAT).unwrap();
        assert_eq!(parse_exif_datetime("2021-05-03 10:11:12"), Some(expected));
        assert_eq!(parse_exif_datetime("2021:05:03 10:11:12"), Some(expected));
        assert_eq!(parse_exif_datetime("2021/05/03 10:11:12"), Some(expected));
        assert!(parse_exif_datetime("2021.05.03").is_some());
        assert!(parse_exif_datetime("    :  :     :  :  ").is_none());
    }

    #[test]
    fn test_native_reports_modification_time() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("b.jpg");
        std::fs::write(&path, b"not really a jpeg").unwrap();

        let when = NaiveDateTime::parse_from_str("2020:01:01 12:00:00", METADATA_FORMAT)
            .unwrap()
            .and_local_timezone(Local)
            .single()
            .unwrap();
        filetime::set_file_mtime(&path, filetime::FileTime::from_unix_time(when.timestamp(), 0)).unwrap();

        let report = NativeMetadata.extract(&path).unwrap();
        assert_eq!(report.create_date, None);
        let modify = report.modify_date.unwrap();
        assert!(modify.starts_with("2020:01:01 12:00:00"), "{modify}");

        let date = parse_date_value(&modify, DateParsing::Strict).unwrap();
        assert_eq!((date.year.as_str(), date.month.as_str()), ("2020", "01"));
    }

    #[test]
    fn test_native_missing_file() {
        let dir = tempdir().unwrap();
        assert!(NativeMetadata.extract(&dir.path().join("gone.jpg")).is_err());
    }
}
