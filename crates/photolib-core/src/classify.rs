use std::path::Path;

use serde::{Deserialize, Serialize};

/// Photo and video suffixes accepted for organizing. Matching is an exact,
/// case-sensitive suffix match, so both spellings are listed.
const MEDIA_EXTENSIONS: &[&str] = &[
    ".jpg", ".JPG",
    ".jpeg", ".JPEG",
    ".png", ".PNG",
    ".gif", ".GIF",
    ".heic", ".HEIC",
    ".tif", ".TIF",
    ".tiff", ".TIFF",
    ".dng", ".DNG",
    ".cr2", ".CR2",
    ".nef", ".NEF",
    ".arw", ".ARW",
    ".mov", ".MOV",
    ".mp4", ".MP4",
    ".m4v", ".M4V",
    ".avi", ".AVI",
    ".3gp", ".3GP",
    ".mts", ".MTS",
];

/// Names written by operating systems, NAS boxes and photo tools that are
/// never media, regardless of extension.
const SYSTEM_ARTIFACTS: &[&str] = &[
    "Thumbs.db",
    "thumbs.db",
    "desktop.ini",
    "Desktop.ini",
    "Icon\r",
    "$RECYCLE.BIN",
    "System Volume Information",
    "lost+found",
    "@eaDir",
    "ZbThumbnail.info",
];

const HIDDEN_MARKER: char = '.';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

/// Hidden entries and known system artifacts, files or directories alike.
pub fn is_excluded_name(name: &str) -> bool {
    name.starts_with(HIDDEN_MARKER) || SYSTEM_ARTIFACTS.contains(&name)
}

/// Check the name against the media allow-list.
pub fn has_media_extension(name: &str) -> bool {
    MEDIA_EXTENSIONS.iter().any(|ext| name.ends_with(ext) && name.len() > ext.len())
}

/// A file name the organizer will try to place.
pub fn is_organizable(name: &str) -> bool {
    !is_excluded_name(name) && has_media_extension(name)
}

/// Photo or video, for allow-listed names only.
pub fn media_kind(name: &str) -> Option<MediaKind> {
    if !has_media_extension(name) {
        return None;
    }
    // mime_guess maps .mts to a non-video type
    if name.ends_with(".mts") || name.ends_with(".MTS") {
        return Some(MediaKind::Video);
    }
    let kind = match mime_guess::from_path(name).first() {
        Some(mime) if mime.type_() == mime_guess::mime::VIDEO => MediaKind::Video,
        _ => MediaKind::Photo,
    };
    Some(kind)
}

/// The final path component as UTF-8, if there is one.
pub fn file_name_str(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}
