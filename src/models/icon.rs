use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// An app icon candidate found in the repository.
///
/// `filename` is derived from the source path so the same file found by two
/// scanners collapses into one entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Icon {
    pub filename: String,
    pub path: PathBuf,
}

impl Icon {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let digest = Sha256::digest(path.to_string_lossy().as_bytes());
        let mut filename = hex::encode(digest);
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            filename.push('.');
            filename.push_str(ext);
        }
        Self {
            filename,
            path: path.to_path_buf(),
        }
    }
}
