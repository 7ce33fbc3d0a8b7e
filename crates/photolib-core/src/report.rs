use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::error::Result;

#[derive(Serialize)]
struct ReportFile<'a, T: Serialize> {
    tool: &'a str,
    generated_at: String,
    source_dir: &'a Path,
    dest_dir: &'a Path,
    result: &'a T,
}

/// Write a run result as pretty JSON to `report_path`.
pub fn write_report<T: Serialize>(
    tool: &str,
    source_dir: &Path,
    dest_dir: &Path,
    result: &T,
    report_path: &Path,
) -> Result<()> {
    let report = ReportFile {
        tool,
        generated_at: Local::now().to_rfc3339(),
        source_dir,
        dest_dir,
        result,
    };

    let mut writer = BufWriter::new(File::create(report_path)?);
    serde_json::to_writer_pretty(&mut writer, &report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// `path` relative to `root` for display, or `path` itself when it is not
/// below `root`.
pub fn relative_to(path: &Path, root: &Path) -> PathBuf {
    if path.starts_with(root) {
        if let Some(rel) = pathdiff::diff_paths(path, root) {
            return rel;
        }
    }
    path.to_path_buf()
}
