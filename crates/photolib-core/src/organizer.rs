use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use log::{debug, error, info, warn};

use crate::date::MetadataExtractor;
use crate::error::{Error, Result};
use crate::hash;
use crate::media::MediaFile;
use crate::walk;
use crate::{
    validate_root, FailureKind, FileFailure, OrganizationResult, OrganizeOptions, Placement,
    ProgressCallback, ThrottledProgress, TransferMode,
};

/// Place every dated media file below `source_dir` into its date bucket
/// under `dest_dir`.
///
/// Only a missing or unreadable root is an error. Per-file problems are
/// recorded in the result and the run carries on.
pub fn organize(
    options: &OrganizeOptions,
    extractor: &dyn MetadataExtractor,
    progress_callback: &ProgressCallback,
) -> Result<OrganizationResult> {
    validate_root(&options.source_dir)?;
    validate_root(&options.dest_dir)?;

    let mut organizer = Organizer {
        options,
        extractor,
        progress: ThrottledProgress::new(progress_callback),
        dest_canonical: fs::canonicalize(&options.dest_dir)?,
        visited: HashSet::new(),
        processed: 0,
    };
    let mut result = OrganizationResult::default();
    organizer.organize_dir(&options.source_dir, 0, &mut result)?;
    result.files_processed = organizer.processed;

    info!(
        "Organized {}: {} files examined, {} transferred ({} renamed), {} already present, {} undated, {} failed",
        options.source_dir.display(),
        result.files_processed,
        result.files_transferred,
        result.files_renamed,
        result.files_identical,
        result.skipped_no_date.len(),
        result.failures.len()
    );
    Ok(result)
}

struct Organizer<'a> {
    options: &'a OrganizeOptions,
    extractor: &'a dyn MetadataExtractor,
    progress: ThrottledProgress<'a>,
    dest_canonical: PathBuf,
    /// Canonical directories already organized; symlinks can reach a
    /// directory twice or loop back to an ancestor.
    visited: HashSet<PathBuf>,
    processed: u64,
}

impl Organizer<'_> {
    /// Files of `dir` first, then each subdirectory. `depth` is the distance
    /// from the source root and is passed down by value.
    fn organize_dir(&mut self, dir: &Path, depth: usize, result: &mut OrganizationResult) -> Result<()> {
        if !self.visited.insert(fs::canonicalize(dir)?) {
            debug!("Already organized {}, skipping", dir.display());
            return Ok(());
        }
        let listing = walk::list_dir(dir)?;
        debug!(
            "Processing directory: {} ({} files, {} subdirectories)",
            dir.display(),
            listing.files.len(),
            listing.subdirs.len()
        );

        for file in &listing.files {
            self.organize_file(file, result);
        }

        if !self.options.recurse || self.options.max_depth.is_some_and(|max| depth >= max) {
            return Ok(());
        }

        for sub in &listing.subdirs {
            if self.is_destination(sub) {
                debug!("Not descending into destination tree {}", sub.display());
                continue;
            }
            if let Err(e) = self.organize_dir(sub, depth + 1, result) {
                warn!("Cannot read directory {}: {}", sub.display(), e);
                result.failures.push(FileFailure::new(sub, FailureKind::Unreadable, &e));
            }
        }
        Ok(())
    }

    fn is_destination(&self, dir: &Path) -> bool {
        fs::canonicalize(dir).map_or(false, |c| c == self.dest_canonical)
    }

    fn organize_file(&mut self, path: &Path, result: &mut OrganizationResult) {
        self.progress
            .report("organize", self.processed, 0, &path.display().to_string());
        self.processed += 1;

        let Some(mut media) = MediaFile::from_path(path) else {
            debug!("Not a media file: {}", path.display());
            result.files_ignored += 1;
            return;
        };

        let options = self.options;
        let Some(resolved) = media
            .date(self.extractor, options.date_parsing, options.embedded_only)
            .cloned()
        else {
            info!("Could not determine date for {}", path.display());
            result.skipped_no_date.push(path.to_path_buf());
            return;
        };
        debug!(
            "Date for {}: {}:{}:{} ({:?})",
            path.display(),
            resolved.date.year,
            resolved.date.month,
            resolved.date.day,
            resolved.source
        );

        let bucket = resolved.date.bucket(&options.dest_dir, options.bucket_depth);
        if let Err(e) = ensure_dir(&bucket) {
            let e = Error::Transfer { path: bucket, source: e };
            error!("{}", e);
            result.failures.push(FileFailure::new(path, FailureKind::Transfer, &e));
            return;
        }

        let candidate = bucket.join(&media.filename);
        if let Err(e) = self.place(&mut media, &candidate, result) {
            let kind = match e {
                Error::Transfer { .. } => FailureKind::Transfer,
                Error::PartialMove { .. } => FailureKind::PartialMove,
                _ => FailureKind::Unreadable,
            };
            error!("{}: {}", path.display(), e);
            result.failures.push(FileFailure::new(path, kind, &e));
        }
    }

    /// Put `media` at `candidate`, or next to it under a content-suffixed name
    /// when the name is taken by different content.
    fn place(&self, media: &mut MediaFile, candidate: &Path, result: &mut OrganizationResult) -> Result<()> {
        if !path_taken(candidate) {
            return self.transfer(media, candidate, false, result);
        }

        result.skipped_exists.push(media.path.clone());
        let digest = media.digest()?;
        if same_content(candidate, &digest)? {
            info!("File already exists: {}", candidate.display());
            result.files_identical += 1;
            return Ok(());
        }

        let renamed = candidate.with_file_name(media.suffixed_name(&digest.short()));
        if path_taken(&renamed) {
            if same_content(&renamed, &digest)? {
                info!("File already exists: {}", renamed.display());
                result.files_identical += 1;
                return Ok(());
            }
            return Err(Error::Transfer {
                path: renamed,
                source: io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "suffixed name already holds different content",
                ),
            });
        }

        info!(
            "Name collision at {}, writing {}",
            candidate.display(),
            renamed.display()
        );
        self.transfer(media, &renamed, true, result)
    }

    fn transfer(
        &self,
        media: &MediaFile,
        dest: &Path,
        renamed: bool,
        result: &mut OrganizationResult,
    ) -> Result<()> {
        let preserve_mtime = self.options.preserve_mtime;
        match self.options.transfer {
            TransferMode::Copy => copy_file(&media.path, dest, preserve_mtime)?,
            TransferMode::Move => move_file(&media.path, dest, preserve_mtime)?,
        }
        info!(
            "{} {} to {}",
            if self.options.transfer == TransferMode::Move { "Moved" } else { "Copied" },
            media.path.display(),
            dest.display()
        );

        result.files_transferred += 1;
        if renamed {
            result.files_renamed += 1;
        }
        result.placements.push(Placement {
            source: media.path.clone(),
            destination: dest.to_path_buf(),
            renamed,
        });
        Ok(())
    }
}

/// Anything at `path`, dangling symlinks included.
fn path_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn same_content(existing: &Path, digest: &hash::ContentDigest) -> Result<bool> {
    match hash::full_digest(existing) {
        Ok(d) => Ok(d == *digest),
        Err(e) => {
            warn!("Cannot hash existing {}: {}", existing.display(), e);
            Err(e)
        }
    }
}

/// Create `dir` and its parents; an existing directory is fine.
fn ensure_dir(dir: &Path) -> io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir)?;
    info!("Created directory: {}", dir.display());
    Ok(())
}

/// Copy `source` to `dest`. A failed copy leaves nothing at `dest`.
pub fn copy_file(source: &Path, dest: &Path, preserve_mtime: bool) -> Result<()> {
    if let Err(e) = fs::copy(source, dest) {
        let _ = fs::remove_file(dest);
        return Err(Error::Transfer {
            path: source.to_path_buf(),
            source: e,
        });
    }
    if preserve_mtime {
        if let Err(e) = copy_mtime(source, dest) {
            warn!("Could not keep modification time on {}: {}", dest.display(), e);
        }
    }
    Ok(())
}

fn copy_mtime(source: &Path, dest: &Path) -> io::Result<()> {
    let meta = fs::metadata(source)?;
    filetime::set_file_mtime(dest, FileTime::from_last_modification_time(&meta))
}

/// Rename, or copy and remove when the rename is refused (e.g. across
/// filesystems). Failing to remove the source after the copy is a
/// [`Error::PartialMove`].
pub fn move_file(source: &Path, dest: &Path, preserve_mtime: bool) -> Result<()> {
    match fs::rename(source, dest) {
        Ok(()) => return Ok(()),
        Err(e) => debug!("rename {} failed ({}), copying instead", source.display(), e),
    }
    copy_file(source, dest, preserve_mtime)?;
    fs::remove_file(source).map_err(|e| Error::PartialMove {
        source_path: source.to_path_buf(),
        dest_path: dest.to_path_buf(),
        source: e,
    })
}
