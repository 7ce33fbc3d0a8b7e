use std::path::{Path, PathBuf};
use std::process::Command;

use log::trace;

use super::{MetadataExtractor, MetadataReport};
use crate::error::{Error, Result};

const CREATE_DATE_LABEL: &str = "Create Date";
const MODIFY_DATE_LABEL: &str = "File Modification Date/Time";

/// Metadata read by running the `exiftool` program once per file.
#[derive(Debug, Clone)]
pub struct Exiftool {
    program: PathBuf,
}

impl Default for Exiftool {
    fn default() -> Self {
        Self::new("exiftool")
    }
}

impl Exiftool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run `exiftool -ver` and return the version string.
    pub fn version(&self) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("-ver")
            .output()
            .map_err(|e| Error::Extractor(format!("cannot run {}: {}", self.program.display(), e)))?;
        if !output.status.success() {
            return Err(Error::Extractor(format!(
                "{} -ver exited with {}",
                self.program.display(),
                output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl MetadataExtractor for Exiftool {
    fn extract(&self, path: &Path) -> Result<MetadataReport> {
        let output = Command::new(&self.program)
            .arg("-CreateDate")
            .arg("-FileModifyDate")
            .arg(path)
            .output()
            .map_err(|e| Error::Extractor(format!("cannot run {}: {}", self.program.display(), e)))?;

        // exiftool exits non-zero for unreadable files but may still print tags
        if !output.status.success() && output.stdout.is_empty() {
            return Err(Error::Extractor(format!(
                "{} exited with {} for {}: {}",
                self.program.display(),
                output.status,
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        trace!("exiftool output for {}:\n{}", path.display(), text);
        Ok(parse_exiftool_output(&text))
    }
}

/// Parse `Label   : value` lines. The first non-empty value per field wins.
pub fn parse_exiftool_output(text: &str) -> MetadataReport {
    let mut report = MetadataReport::default();
    for line in text.lines() {
        let Some((label, value)) = line.split_once(": ") else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let slot = if label.contains(MODIFY_DATE_LABEL) {
            &mut report.modify_date
        } else if label.contains(CREATE_DATE_LABEL) {
            &mut report.create_date
        } else {
            continue;
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }
    report
}
