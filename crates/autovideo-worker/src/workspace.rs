//! Per-job temporary directory.

use autovideo_models::JobId;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::error::CleanupFailure;

/// Path of a per-scene file in `dir`, e.g. `scene_003_clip.mp4`.
pub fn scene_file(dir: &Path, scene_index: usize, suffix: &str) -> PathBuf {
    dir.join(format!("scene_{:03}_{}", scene_index, suffix))
}

/// Holds every transient file of one job.
///
/// Dropping the workspace removes it silently; [`JobWorkspace::close`]
/// reports removal failures instead.
#[derive(Debug)]
pub struct JobWorkspace {
    dir: TempDir,
}

impl JobWorkspace {
    /// Create the directory under `base`, or the system temp dir.
    pub async fn create(base: Option<&Path>, job_id: &JobId) -> std::io::Result<Self> {
        let prefix = format!("autovideo-{}-", job_id);
        let dir = match base {
            Some(base) => {
                tokio::fs::create_dir_all(base).await?;
                tempfile::Builder::new().prefix(&prefix).tempdir_in(base)?
            }
            None => tempfile::Builder::new().prefix(&prefix).tempdir()?,
        };
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Remove the directory and everything in it.
    pub fn close(self) -> Result<(), CleanupFailure> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .map_err(|source| CleanupFailure { path, source })
    }
}
