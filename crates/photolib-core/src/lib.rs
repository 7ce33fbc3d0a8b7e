pub mod classify;
pub mod date;
pub mod error;
pub mod faces;
pub mod hash;
pub mod media;
pub mod organizer;
pub mod report;
pub mod verifier;
pub mod walk;

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

pub use date::{BucketDepth, DateParsing, Exiftool, MetadataExtractor, NativeMetadata};
pub use error::{Error, Result};
pub use faces::{CommandFaceDetector, FaceDetector};
pub use hash::ContentDigest;
pub use organizer::organize;
pub use verifier::verify;

fn default_true() -> bool {
    true
}

/// Copy leaves the source in place, move removes it after a successful write.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    #[default]
    Copy,
    Move,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeOptions {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    /// Descend into subdirectories of `source_dir`
    #[serde(default)]
    pub recurse: bool,
    /// With `recurse`, how many levels below `source_dir` to visit. `None` is unlimited.
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub transfer: TransferMode,
    #[serde(default)]
    pub bucket_depth: BucketDepth,
    #[serde(default)]
    pub date_parsing: DateParsing,
    /// Never fall back to the filesystem modification date
    #[serde(default)]
    pub embedded_only: bool,
    /// Give copies the modification time of their source
    #[serde(default = "default_true")]
    pub preserve_mtime: bool,
}

impl OrganizeOptions {
    pub fn new(source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
            recurse: false,
            max_depth: None,
            transfer: TransferMode::Copy,
            bucket_depth: BucketDepth::YearMonth,
            date_parsing: DateParsing::Lenient,
            embedded_only: false,
            preserve_mtime: true,
        }
    }

    pub fn with_recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_transfer(mut self, transfer: TransferMode) -> Self {
        self.transfer = transfer;
        self
    }

    pub fn with_bucket_depth(mut self, bucket_depth: BucketDepth) -> Self {
        self.bucket_depth = bucket_depth;
        self
    }

    pub fn with_date_parsing(mut self, date_parsing: DateParsing) -> Self {
        self.date_parsing = date_parsing;
        self
    }

    pub fn with_embedded_only(mut self, embedded_only: bool) -> Self {
        self.embedded_only = embedded_only;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyOptions {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    /// Regular expression matched anywhere in the full source path
    #[serde(default)]
    pub ignore: Option<String>,
    /// Only photos in which the face detector finds a face
    #[serde(default)]
    pub faces_only: bool,
    /// Restrict source candidates to the media allow-list. Always on with `faces_only`.
    #[serde(default = "default_true")]
    pub extension_filter: bool,
}

impl VerifyOptions {
    pub fn new(source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
            ignore: None,
            faces_only: false,
            extension_filter: true,
        }
    }

    pub fn with_ignore(mut self, pattern: Option<String>) -> Self {
        self.ignore = pattern;
        self
    }

    pub fn with_faces_only(mut self, faces_only: bool) -> Self {
        self.faces_only = faces_only;
        self
    }

    pub fn with_extension_filter(mut self, extension_filter: bool) -> Self {
        self.extension_filter = extension_filter;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Copy or move did not complete
    Transfer,
    /// Destination written, source still present
    PartialMove,
    /// File or directory could not be read or hashed
    Unreadable,
}

/// A per-file error that was recorded instead of aborting the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl FileFailure {
    pub fn new(path: impl Into<PathBuf>, kind: FailureKind, error: &Error) -> Self {
        Self {
            path: path.into(),
            kind,
            message: error.to_string(),
        }
    }
}

/// Where one source file ended up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Written under a content-suffixed name because the plain name was taken
    pub renamed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationResult {
    /// Every file examined across the whole subtree
    pub files_processed: u64,
    /// Files copied or moved into the destination, renamed ones included
    pub files_transferred: u64,
    /// Subset of `files_transferred` written under a suffixed name
    pub files_renamed: u64,
    /// Files whose content was already present in their bucket
    pub files_identical: u64,
    /// Files ignored by the extension allow-list
    pub files_ignored: u64,
    pub placements: Vec<Placement>,
    /// Files with no usable date
    pub skipped_no_date: Vec<PathBuf>,
    /// Files whose name was already taken in the bucket. Includes files that
    /// were then written under a suffixed name.
    pub skipped_exists: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

impl OrganizationResult {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn partial_moves(&self) -> impl Iterator<Item = &FileFailure> {
        self.failures.iter().filter(|f| f.kind == FailureKind::PartialMove)
    }
}

/// A source file left out of the comparison, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// A source file whose content is not anywhere in the destination.
#[derive(Debug, Clone, Serialize)]
pub struct Unmatched {
    pub path: PathBuf,
    pub digest: ContentDigest,
    /// A destination file with the same name but different content, if any
    pub same_name_hint: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    /// Distinct contents among the source candidates
    pub source_unique: u64,
    /// Distinct contents indexed in the destination
    pub dest_unique: u64,
    pub verified: u64,
    /// Sorted by path
    pub unmatched: Vec<Unmatched>,
    /// Source files excluded by the ignore pattern
    pub ignored: u64,
    /// Source files excluded by the extension allow-list
    pub not_media: u64,
    /// Photos without a detected face
    pub no_face: u64,
    /// Videos and detector failures under faces-only
    pub skipped: Vec<SkippedFile>,
    pub failures: Vec<FileFailure>,
}

impl VerifyReport {
    pub fn unmatched_paths(&self) -> Vec<&Path> {
        self.unmatched.iter().map(|u| u.path.as_path()).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty() && self.failures.is_empty()
    }
}

/// Type alias for progress callback: `(stage, current, total, message)`.
/// `total` is 0 when the amount of work is not known up front.
pub type ProgressCallback<'a> = dyn Fn(&str, u64, u64, &str) + 'a;

/// Throttled progress reporter. Emits at most every 200ms, and always on completion.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback<'a>,
    last_emit: Cell<Option<Instant>>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: &'a ProgressCallback<'a>) -> Self {
        Self {
            inner,
            last_emit: Cell::new(None),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        let is_done = total > 0 && current + 1 >= total;
        if !is_done {
            if let Some(last) = self.last_emit.get() {
                if last.elapsed() < Duration::from_millis(200) {
                    return;
                }
            }
            self.last_emit.set(Some(Instant::now()));
        }
        (self.inner)(stage, current, total, message);
    }
}

/// A run root must exist and be a directory.
pub(crate) fn validate_root(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::RootNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(Error::RootNotDirectory(path.to_path_buf()));
    }
    // read_dir surfaces permission problems before any work starts
    std::fs::read_dir(path)?;
    Ok(())
}
