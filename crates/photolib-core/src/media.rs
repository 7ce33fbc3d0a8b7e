use std::path::{Path, PathBuf};

use crate::classify::{self, MediaKind};
use crate::date::{self, DateParsing, DateResult, MetadataExtractor};
use crate::error::Result;
use crate::hash::{self, ContentDigest};

/// One candidate file for the current run. Rebuilt from the filesystem every
/// run; the date and digest are filled in on first use.
#[derive(Debug, Clone)]
pub struct MediaFile {
    /// Current location on disk
    pub path: PathBuf,
    /// Just the filename
    pub filename: String,
    pub kind: MediaKind,
    date: Option<Option<DateResult>>,
    digest: Option<ContentDigest>,
}

impl MediaFile {
    /// `None` unless the name is UTF-8, visible and on the media allow-list.
    pub fn from_path(path: &Path) -> Option<Self> {
        let filename = classify::file_name_str(path)?;
        if !classify::is_organizable(filename) {
            return None;
        }
        Some(Self {
            path: path.to_path_buf(),
            filename: filename.to_string(),
            kind: classify::media_kind(filename)?,
            date: None,
            digest: None,
        })
    }

    /// Name without the extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.filename)
    }

    /// Extension including the leading dot, or empty.
    pub fn extension(&self) -> String {
        Path::new(&self.filename)
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default()
    }

    /// `<stem>_<suffix><ext>`
    pub fn suffixed_name(&self, suffix: &str) -> String {
        format!("{}_{}{}", self.stem(), suffix, self.extension())
    }

    pub fn date(
        &mut self,
        extractor: &dyn MetadataExtractor,
        parsing: DateParsing,
        embedded_only: bool,
    ) -> Option<&DateResult> {
        if self.date.is_none() {
            self.date = Some(date::resolve_date(extractor, &self.path, parsing, embedded_only));
        }
        self.date.as_ref().and_then(|d| d.as_ref())
    }

    pub fn digest(&mut self) -> Result<ContentDigest> {
        if let Some(digest) = self.digest {
            return Ok(digest);
        }
        let digest = hash::full_digest(&self.path)?;
        self.digest = Some(digest);
        Ok(digest)
    }
}
