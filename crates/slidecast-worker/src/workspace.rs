//! Per-run scratch directory.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use slidecast_models::RunId;

use crate::error::WorkerResult;

/// Scratch directory for one run's intermediate files.
///
/// The directory is removed when the value is dropped, on every exit path,
/// unless [`Workspace::keep`] was called.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    retained: bool,
}

impl Workspace {
    /// Create `<parent>/<run_id>`.
    pub async fn create(parent: impl AsRef<Path>, run_id: &RunId) -> WorkerResult<Self> {
        let root = parent.as_ref().join(run_id.as_str());
        tokio::fs::create_dir_all(&root).await?;
        debug!(workspace = %root.display(), "Created workspace");
        Ok(Self {
            root,
            retained: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Leave the directory on disk and return its path.
    pub fn keep(mut self) -> PathBuf {
        self.retained = true;
        info!(workspace = %self.root.display(), "Keeping workspace");
        self.root.clone()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.retained {
            return;
        }
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => debug!(workspace = %self.root.display(), "Removed workspace"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(workspace = %self.root.display(), error = %e, "Failed to remove workspace"),
        }
    }
}
