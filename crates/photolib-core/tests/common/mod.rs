#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use photolib_core::date::{MetadataExtractor, MetadataReport};
use photolib_core::{Error, FaceDetector, Result};

/// Metadata keyed by file name. Unknown files make the extractor fail, the
/// way exiftool does for a file it cannot read.
#[derive(Default)]
pub struct FakeMetadata {
    reports: HashMap<String, MetadataReport>,
}

impl FakeMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn embedded(mut self, name: &str, value: &str) -> Self {
        self.reports.entry(name.to_string()).or_default().create_date = Some(value.to_string());
        self
    }

    pub fn modified(mut self, name: &str, value: &str) -> Self {
        self.reports.entry(name.to_string()).or_default().modify_date = Some(value.to_string());
        self
    }
}

impl MetadataExtractor for FakeMetadata {
    fn extract(&self, path: &Path) -> Result<MetadataReport> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        self.reports
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Extractor(format!("no metadata for {}", name)))
    }
}

/// Face answers keyed by file name; every call is recorded.
#[derive(Default)]
pub struct FakeFaces {
    with_faces: HashSet<String>,
    broken: HashSet<String>,
    pub calls: RefCell<Vec<PathBuf>>,
}

impl FakeFaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn face(mut self, name: &str) -> Self {
        self.with_faces.insert(name.to_string());
        self
    }

    pub fn broken(mut self, name: &str) -> Self {
        self.broken.insert(name.to_string());
        self
    }
}

impl FaceDetector for FakeFaces {
    fn contains_face(&self, path: &Path) -> Result<bool> {
        self.calls.borrow_mut().push(path.to_path_buf());
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if self.broken.contains(name) {
            return Err(Error::FaceDetector(format!("cannot decode {}", name)));
        }
        Ok(self.with_faces.contains(name))
    }
}

pub fn quiet(_stage: &str, _current: u64, _total: u64, _message: &str) {}

pub fn write(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, bytes).unwrap();
}

/// Every file below `root`, relative, sorted.
pub fn tree(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}
