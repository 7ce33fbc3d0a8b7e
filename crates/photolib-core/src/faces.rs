use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::error::{Error, Result};

/// Answers whether an image shows at least one face.
pub trait FaceDetector {
    fn contains_face(&self, path: &Path) -> Result<bool>;
}

/// Sensitivity of the cascade detector. Fixed; not exposed for tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    pub scale_factor: f64,
    pub min_neighbors: u32,
    /// Smallest face edge in pixels
    pub min_size: u32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 5,
            min_size: 30,
        }
    }
}

/// Delegates detection to an external program.
///
/// The program is called as
/// `<program> --scale-factor F --min-neighbors N --min-size S <image>` and
/// must exit 0 when a face is found and 1 when none is. Any other status is a
/// detector failure.
#[derive(Debug, Clone)]
pub struct CommandFaceDetector {
    program: PathBuf,
    params: DetectionParams,
}

impl CommandFaceDetector {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            params: DetectionParams::default(),
        }
    }

    pub fn params(&self) -> DetectionParams {
        self.params
    }
}

impl FaceDetector for CommandFaceDetector {
    fn contains_face(&self, path: &Path) -> Result<bool> {
        let status = Command::new(&self.program)
            .arg("--scale-factor")
            .arg(self.params.scale_factor.to_string())
            .arg("--min-neighbors")
            .arg(self.params.min_neighbors.to_string())
            .arg("--min-size")
            .arg(self.params.min_size.to_string())
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|e| Error::FaceDetector(format!("cannot run {}: {}", self.program.display(), e)))?;

        debug!("face detector exited with {} for {}", status, path.display());
        match status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(Error::FaceDetector(format!(
                "{} exited with {} for {}",
                self.program.display(),
                status,
                path.display()
            ))),
        }
    }
}
