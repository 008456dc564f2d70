//! Process working directory scoped to one scan.

use super::ScanError;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Changes into a directory and changes back when dropped.
#[derive(Debug)]
pub struct WorkdirGuard {
    previous: PathBuf,
}

impl WorkdirGuard {
    pub fn enter(dir: &Path) -> Result<Self, ScanError> {
        let previous = env::current_dir().map_err(|source| ScanError::ChangeDir {
            path: dir.to_path_buf(),
            source,
        })?;
        env::set_current_dir(dir).map_err(|source| ScanError::ChangeDir {
            path: dir.to_path_buf(),
            source,
        })?;
        debug!(dir = %dir.display(), "Entered scan directory");
        Ok(Self { previous })
    }

    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        if let Err(err) = env::set_current_dir(&self.previous) {
            warn!(
                dir = %self.previous.display(),
                error = %err,
                "Failed to restore working directory"
            );
        }
    }
}
