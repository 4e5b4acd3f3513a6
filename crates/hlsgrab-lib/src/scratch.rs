use crate::error::HlsGrabError;
use std::path::{Path, PathBuf};

/// Staging area for downloaded segments.
///
/// The directory outlives the process: nothing here removes it, so a rerun
/// pointed at the same directory picks up segments that are already present.
#[derive(Clone, Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Uses `path`, creating it if needed.
    pub fn at(path: impl Into<PathBuf>) -> Result<Self, HlsGrabError> {
        let path = path.into();
        std::fs::create_dir_all(&path).map_err(|e| HlsGrabError::ScratchDirectoryCreation {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { path })
    }

    /// Creates a fresh directory under the system temp dir.
    pub fn create_temporary() -> Result<Self, HlsGrabError> {
        let dir = tempfile::Builder::new()
            .prefix("hlsgrab")
            .tempdir()
            .map_err(|e| HlsGrabError::ScratchDirectoryCreation {
                path: std::env::temp_dir(),
                reason: e.to_string(),
            })?;
        Ok(Self { path: dir.keep() })
    }

    pub fn from_config(scratch_dir: Option<&Path>) -> Result<Self, HlsGrabError> {
        match scratch_dir {
            Some(path) => Self::at(path),
            None => Self::create_temporary(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the staged segment at `position` for `base_name`.
    pub fn segment_path(&self, base_name: &str, position: usize) -> PathBuf {
        self.path.join(format!("{base_name}._{position}"))
    }

    /// Path a segment is streamed into before it is moved to `segment_path`.
    pub fn partial_segment_path(&self, base_name: &str, position: usize) -> PathBuf {
        self.path.join(format!("{base_name}._{position}.part"))
    }
}
