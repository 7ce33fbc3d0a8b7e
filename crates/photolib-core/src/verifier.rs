use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::classify::{self, MediaKind};
use crate::error::{Error, Result};
use crate::faces::FaceDetector;
use crate::hash::{self, ContentDigest};
use crate::walk::{self, WalkScope};
use crate::{
    validate_root, FailureKind, FileFailure, ProgressCallback, SkippedFile, ThrottledProgress,
    Unmatched, VerifyOptions, VerifyReport,
};

/// Content digest -> one path holding that content. A later path with the
/// same digest replaces the earlier one; the index only answers whether the
/// content exists.
#[derive(Debug, Default)]
pub struct DestinationIndex {
    by_digest: HashMap<ContentDigest, PathBuf>,
}

impl DestinationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the path previously recorded for `digest`, if any.
    pub fn insert(&mut self, digest: ContentDigest, path: PathBuf) -> Option<PathBuf> {
        self.by_digest.insert(digest, path)
    }

    pub fn contains(&self, digest: &ContentDigest) -> bool {
        self.by_digest.contains_key(digest)
    }

    pub fn get(&self, digest: &ContentDigest) -> Option<&Path> {
        self.by_digest.get(digest).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.by_digest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_digest.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.by_digest.values().map(PathBuf::as_path)
    }

    /// NFC base name -> indexed path. The smallest path wins so hints are
    /// stable across walk orders.
    pub fn by_name(&self) -> HashMap<String, &Path> {
        let mut names: HashMap<String, &Path> = HashMap::new();
        for path in self.paths() {
            let Some(name) = normalized_name(path) else { continue };
            names
                .entry(name)
                .and_modify(|current| {
                    if path < *current {
                        *current = path;
                    }
                })
                .or_insert(path);
        }
        names
    }
}

fn normalized_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().nfc().collect::<String>())
}

/// Check that the content of every candidate file below `source_dir` exists
/// somewhere below `dest_dir`.
///
/// `faces` is required when `options.faces_only` is set.
pub fn verify(
    options: &VerifyOptions,
    faces: Option<&dyn FaceDetector>,
    progress_callback: &ProgressCallback,
) -> Result<VerifyReport> {
    validate_root(&options.source_dir)?;
    validate_root(&options.dest_dir)?;

    let face_filter = if options.faces_only {
        Some(faces.ok_or_else(|| {
            Error::Configuration("faces-only verification needs a face detector".to_string())
        })?)
    } else {
        None
    };
    let ignore = options.ignore.as_deref().map(Regex::new).transpose()?;

    let tp = ThrottledProgress::new(progress_callback);
    let mut report = VerifyReport::default();

    // Stage 1: index the destination
    info!("Scanning destination directory: {}", options.dest_dir.display());
    let dest_files = collect_files(&options.dest_dir, WalkScope::Everything, &mut report.failures);
    let index = index_files(&dest_files, &tp, &mut report.failures);
    info!("Found {} unique files in destination directory", index.len());

    // Stage 2: pick and hash source candidates
    info!("Scanning source directory: {}", options.source_dir.display());
    let source_files = collect_files(&options.source_dir, WalkScope::Visible, &mut report.failures);
    let filter = CandidateFilter {
        extension_filter: options.extension_filter || options.faces_only,
        ignore: ignore.as_ref(),
        faces: face_filter,
    };
    let total = source_files.len() as u64;
    let mut sources: HashMap<ContentDigest, PathBuf> = HashMap::new();
    for (i, path) in source_files.into_iter().enumerate() {
        tp.report("scan", i as u64, total, "Hashing source files");
        if !filter.accepts(&path, &mut report) {
            continue;
        }
        match hash::full_digest(&path) {
            Ok(digest) => {
                sources.insert(digest, path);
            }
            Err(e) => {
                warn!("Cannot hash {}: {}", path.display(), e);
                report.failures.push(FileFailure::new(path, FailureKind::Unreadable, &e));
            }
        }
    }
    info!("Found {} unique files in source directory", sources.len());

    // Stage 3: match by content
    let names = index.by_name();
    for (digest, path) in &sources {
        if index.contains(digest) {
            report.verified += 1;
            continue;
        }
        let same_name_hint = normalized_name(path)
            .and_then(|name| names.get(&name))
            .map(|p| p.to_path_buf());
        debug!("Not found: {} (same name in destination: {:?})", path.display(), same_name_hint);
        report.unmatched.push(Unmatched {
            path: path.clone(),
            digest: *digest,
            same_name_hint,
        });
    }
    report.unmatched.sort_by(|a, b| a.path.cmp(&b.path));
    report.source_unique = sources.len() as u64;
    report.dest_unique = index.len() as u64;

    info!(
        "Verified {} of {} unique source files, {} not found",
        report.verified,
        report.source_unique,
        report.unmatched.len()
    );
    Ok(report)
}

/// Walk `root`, recording unreadable entries instead of stopping.
fn collect_files(root: &Path, scope: WalkScope, failures: &mut Vec<FileFailure>) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for item in walk::walk_files(root, scope) {
        match item {
            Ok(path) => files.push(path),
            Err(e) => {
                let path = match &e {
                    Error::Walk(walk_err) => walk_err.path().unwrap_or(root),
                    _ => root,
                };
                warn!("Skipping unreadable entry {}: {}", path.display(), e);
                failures.push(FileFailure::new(path, FailureKind::Unreadable, &e));
            }
        }
    }
    files
}

/// Hash every file into a fresh [`DestinationIndex`].
pub fn index_files(
    files: &[PathBuf],
    progress: &ThrottledProgress,
    failures: &mut Vec<FileFailure>,
) -> DestinationIndex {
    let mut index = DestinationIndex::new();
    let total = files.len() as u64;
    for (i, path) in files.iter().enumerate() {
        progress.report("index", i as u64, total, "Hashing destination files");
        match hash::full_digest(path) {
            Ok(digest) => {
                if let Some(previous) = index.insert(digest, path.clone()) {
                    debug!("{} duplicates {}", path.display(), previous.display());
                }
            }
            Err(e) => {
                warn!("Cannot hash {}: {}", path.display(), e);
                failures.push(FileFailure::new(path, FailureKind::Unreadable, &e));
            }
        }
    }
    index
}

struct CandidateFilter<'a> {
    extension_filter: bool,
    ignore: Option<&'a Regex>,
    faces: Option<&'a dyn FaceDetector>,
}

impl CandidateFilter<'_> {
    /// Cheap checks first; the face detector only sees photos that survive
    /// the extension and ignore filters.
    fn accepts(&self, path: &Path, report: &mut VerifyReport) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.extension_filter && !classify::has_media_extension(&name) {
            report.not_media += 1;
            return false;
        }

        if let Some(re) = self.ignore {
            if re.is_match(&path.to_string_lossy()) {
                debug!("Ignoring {}", path.display());
                report.ignored += 1;
                return false;
            }
        }

        let Some(detector) = self.faces else {
            return true;
        };

        if classify::media_kind(&name) == Some(MediaKind::Video) {
            report.skipped.push(SkippedFile {
                path: path.to_path_buf(),
                reason: "video files are not checked for faces".to_string(),
            });
            return false;
        }

        match detector.contains_face(path) {
            Ok(true) => true,
            Ok(false) => {
                report.no_face += 1;
                false
            }
            Err(e) => {
                warn!("Face detection failed for {}, treating as no face: {}", path.display(), e);
                report.skipped.push(SkippedFile {
                    path: path.to_path_buf(),
                    reason: format!("face detection failed: {}", e),
                });
                false
            }
        }
    }
}
