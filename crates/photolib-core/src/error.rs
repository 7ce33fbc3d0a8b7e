use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised by the organizer and verifier.
///
/// Only the root checks, pattern compilation and configuration errors are
/// returned from a whole run. Everything per-file is caught by the run and
/// recorded in its result.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A source or destination root is missing
    #[error("Root directory not found: {0}")]
    RootNotFound(PathBuf),

    /// A source or destination root exists but is not a directory
    #[error("Root is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    /// Copy or move of a single file failed; nothing usable was left at the destination
    #[error("Transfer failed for {path}: {source}")]
    Transfer {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The destination was written but the source could not be removed.
    /// Both copies now exist.
    #[error("Partial move: {dest_path} was written but {source_path} could not be removed: {source}")]
    PartialMove {
        source_path: PathBuf,
        dest_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata extractor could not run or produced nothing usable
    #[error("Metadata extractor failed: {0}")]
    Extractor(String),

    /// Face detector could not run or returned an unknown status
    #[error("Face detector failed: {0}")]
    FaceDetector(String),

    #[error("Invalid ignore pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Report serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
