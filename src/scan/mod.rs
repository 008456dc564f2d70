//! Scan orchestration: runs the registered scanners against a directory and
//! folds what they report into one [`ScanResultModel`].

pub mod aggregator;
pub mod manual;
pub mod orchestrator;
pub mod workdir;

pub use aggregator::ResultAggregator;
pub use manual::default_result;
pub use orchestrator::{DetectionStatus, ExcludedScanners, ScanOrchestrator, ScannerOutcome};
pub use workdir::WorkdirGuard;

use crate::models::ScanResultModel;
use std::path::PathBuf;
use thiserror::Error;

pub const NO_PLATFORM_DETECTED: &str = "No known platform detected";

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to resolve search directory {path}: {source}")]
    InvalidSearchDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to change working directory to {path}: {source}")]
    ChangeDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No known platform detected")]
    NoPlatformDetected,
}

impl ScanResultModel {
    /// Fails when no scanner contributed an option tree.
    pub fn ensure_detected(&self) -> Result<(), ScanError> {
        if self.scanner_to_options.is_empty() {
            Err(ScanError::NoPlatformDetected)
        } else {
            Ok(())
        }
    }
}
