//! Bounded repository walk shared by all scanners.

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directories that never contain a project root worth reporting.
pub const SKIPPED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "Pods",
    "Carthage",
    "build",
    "platforms",
    ".dart_tool",
    ".gradle",
    ".idea",
];

pub const MAX_DEPTH: usize = 6;

/// Sorted, repository-relative paths of every file and directory found.
#[derive(Debug, Clone)]
pub struct FileIndex {
    root: PathBuf,
    entries: Vec<PathBuf>,
}

impl FileIndex {
    pub fn scan(root: &Path) -> Result<Self> {
        Self::scan_to_depth(root, Some(MAX_DEPTH))
    }

    /// Indexes a self-contained directory such as an `.xcodeproj` bundle with
    /// no depth limit, so its contents are found however deep the bundle sits.
    pub fn scan_bundle(bundle: &Path) -> Result<Self> {
        Self::scan_to_depth(bundle, None)
    }

    fn scan_to_depth(root: &Path, max_depth: Option<usize>) -> Result<Self> {
        if !root.is_dir() {
            anyhow::bail!("search directory is not a directory: {}", root.display());
        }

        let mut entries = Vec::new();
        let walker = WalkBuilder::new(root)
            .max_depth(max_depth)
            .hidden(false)
            .git_ignore(true)
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                !(entry.depth() > 0
                    && entry.file_type().map_or(false, |t| t.is_dir())
                    && SKIPPED_DIRS.contains(&name.as_ref()))
            })
            .build();

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "Failed to read directory entry");
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(root)
                .with_context(|| format!("failed to relativize {}", entry.path().display()))?;
            entries.push(relative.to_path_buf());
        }
        entries.sort();

        debug!(root = %root.display(), entries = entries.len(), "Indexed repository");
        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn absolute(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Entries whose file name equals `name`.
    pub fn named(&self, name: &str) -> Vec<&Path> {
        self.entries
            .iter()
            .filter(|p| p.file_name().map_or(false, |n| n == name))
            .map(PathBuf::as_path)
            .collect()
    }

    pub fn with_extension(&self, extension: &str) -> Vec<&Path> {
        self.entries
            .iter()
            .filter(|p| p.extension().map_or(false, |e| e == extension))
            .map(PathBuf::as_path)
            .collect()
    }

    pub fn exists(&self, relative: &Path) -> bool {
        self.entries.iter().any(|p| p == relative)
    }

    pub fn read_to_string(&self, relative: &Path) -> Result<String> {
        let path = self.absolute(relative);
        std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
    }
}

/// Directory of a relative path as shown to users, `.` for the root.
pub fn display_dir(relative: &Path) -> String {
    match relative.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().to_string(),
        _ => ".".to_string(),
    }
}

/// Filesystem path for a display directory produced by [`display_dir`].
pub fn dir_path(display: &str) -> PathBuf {
    if display == "." {
        PathBuf::new()
    } else {
        PathBuf::from(display)
    }
}

/// Drops directories nested inside another directory of the set.
pub fn outermost(mut dirs: Vec<String>) -> Vec<String> {
    dirs.sort();
    dirs.dedup();
    let all = dirs.clone();
    dirs.into_iter()
        .filter(|dir| {
            !all.iter().any(|other| {
                other != dir && (other == "." || Path::new(dir).starts_with(Path::new(other)))
            })
        })
        .collect()
}
