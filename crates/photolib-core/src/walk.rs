use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::classify;
use crate::error::Result;

/// Immediate children of one directory, split by type and sorted by name.
#[derive(Debug, Default)]
pub struct DirListing {
    pub files: Vec<PathBuf>,
    pub subdirs: Vec<PathBuf>,
}

/// List `dir` without descending. Hidden entries and system artifacts are
/// dropped; symlinks are followed for the file/dir decision.
pub fn list_dir(dir: &Path) -> Result<DirListing> {
    let mut listing = DirListing::default();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_str().map_or(false, classify::is_excluded_name) {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            listing.subdirs.push(path);
        } else if path.is_file() {
            listing.files.push(path);
        }
    }
    listing.files.sort();
    listing.subdirs.sort();
    Ok(listing)
}

/// Which entries a full-tree walk yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkScope {
    /// Every regular file below the root
    Everything,
    /// Skip hidden and system-artifact entries, pruning such directories
    Visible,
}

/// Every file below `root` at any depth, in a stable order.
///
/// Symlinks are followed, so a linked file is yielded like a regular one.
/// Unreadable entries and symlink loops come back as `Err` items so the
/// caller can record them and keep going.
pub fn walk_files(root: &Path, scope: WalkScope) -> impl Iterator<Item = Result<PathBuf>> {
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |e| {
            e.depth() == 0
                || scope == WalkScope::Everything
                || !e.file_name().to_str().map_or(false, classify::is_excluded_name)
        })
        .filter_map(|entry| match entry {
            Ok(e) if e.file_type().is_file() => Some(Ok(e.into_path())),
            Ok(_) => None,
            Err(e) => Some(Err(e.into())),
        })
}
