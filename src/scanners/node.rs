//! `package.json` reading shared by the JavaScript-based scanners.

use super::files::{dir_path, FileIndex};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJson {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

impl PackageJson {
    pub fn read(index: &FileIndex, relative: &Path) -> Result<Self> {
        let content = index.read_to_string(relative)?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", relative.display()))
    }

    /// Whether `name` is a runtime or development dependency.
    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependencies.contains_key(name) || self.dev_dependencies.contains_key(name)
    }

    pub fn has_script(&self, name: &str) -> bool {
        self.scripts.contains_key(name)
    }
}

/// Projects pin yarn by committing its lock file.
pub fn uses_yarn(index: &FileIndex, dir: &str) -> bool {
    index.exists(&dir_path(dir).join("yarn.lock"))
}
