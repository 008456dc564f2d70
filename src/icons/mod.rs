//! App icon candidates collected during a scan.

pub mod upload;

pub use upload::{IconUploader, UploadError, MAX_ATTEMPTS, RETRY_BACKOFF};

use crate::models::Icon;
use std::fs;
use tracing::debug;

/// Icons whose source file is still readable, with their size in bytes.
pub fn with_sizes(icons: &[Icon]) -> Vec<(Icon, u64)> {
    icons
        .iter()
        .filter_map(|icon| match fs::metadata(&icon.path) {
            Ok(meta) if meta.is_file() => Some((icon.clone(), meta.len())),
            _ => {
                debug!(path = %icon.path.display(), "Skipping missing icon");
                None
            }
        })
        .collect()
}
