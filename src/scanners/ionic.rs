//! Ionic projects. Built on Cordova, so a detected Ionic project keeps the
//! cordova scanner from reporting the same directory.

use super::cordova::{HybridFlavor, WebProject};
use super::files::{display_dir, outermost, FileIndex};
use super::{Scanner, ScannerOptions};
use crate::models::{ConfigDescriptor, ConfigMap, OptionNode};
use crate::workflow::{steps, RepoAccess};
use anyhow::Result;
use std::path::Path;
use tracing::debug;

pub const SCANNER_NAME: &str = "ionic";
pub const WORK_DIR_ENV: &str = "IONIC_WORK_DIR";
pub const PLATFORM_ENV: &str = "IONIC_PLATFORM";

const IONIC: HybridFlavor = HybridFlavor {
    name: SCANNER_NAME,
    work_dir_env: WORK_DIR_ENV,
    platform_env: PLATFORM_ENV,
    archive: steps::ionic_archive,
};

#[derive(Default)]
pub struct IonicScanner {
    projects: Vec<WebProject>,
    descriptors: Vec<ConfigDescriptor>,
}

impl IonicScanner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scanner for IonicScanner {
    fn name(&self) -> &'static str {
        SCANNER_NAME
    }

    fn detect_platform(&mut self, search_dir: &Path) -> Result<bool> {
        let index = FileIndex::scan(search_dir)?;
        let dirs = index
            .named("ionic.config.json")
            .into_iter()
            .map(display_dir)
            .collect();

        self.projects = outermost(dirs)
            .into_iter()
            .map(|dir| WebProject::inspect(&index, dir))
            .collect::<Result<_>>()?;
        debug!(projects = self.projects.len(), "Ionic projects found");
        Ok(!self.projects.is_empty())
    }

    fn options(&mut self) -> Result<ScannerOptions> {
        if self.projects.is_empty() {
            anyhow::bail!("No ionic.config.json found");
        }
        let mut descriptors = Vec::new();
        let root = IONIC.tree(&self.projects, &mut descriptors);
        self.descriptors = descriptors;
        Ok(ScannerOptions::new(root))
    }

    fn configs(&self, repo_access: RepoAccess) -> Result<ConfigMap> {
        IONIC.configs(&self.descriptors, repo_access)
    }

    fn default_options(&self) -> OptionNode {
        IONIC.default_tree()
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        IONIC.default_configs()
    }

    fn excluded_scanner_names(&self) -> Vec<&'static str> {
        vec!["cordova", "ios", "android"]
    }
}
