//! Cordova projects, plus the web-hybrid helpers Ionic reuses.

use super::files::{dir_path, display_dir, outermost, FileIndex};
use super::node::{uses_yarn, PackageJson};
use super::{user_input, Scanner, ScannerOptions};
use crate::models::{
    default_config_name, ConfigCatalog, ConfigDescriptor, ConfigFlag, ConfigMap, OptionNode,
    OptionType,
};
use crate::workflow::{steps, PipelineBuilder, RepoAccess, Step, DEPLOY_WORKFLOW, PRIMARY_WORKFLOW};
use anyhow::Result;
use std::path::Path;
use tracing::debug;

pub const SCANNER_NAME: &str = "cordova";
pub const WORK_DIR_ENV: &str = "CORDOVA_WORK_DIR";
pub const PLATFORM_ENV: &str = "CORDOVA_PLATFORM";

pub(super) const TARGET_PLATFORMS: &[&str] = &["ios", "android", "ios,android"];

/// A Cordova-based web project and the JavaScript tooling it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct WebProject {
    pub dir: String,
    pub yarn: bool,
    pub jasmine: bool,
    pub karma: bool,
}

impl WebProject {
    pub fn inspect(index: &FileIndex, dir: String) -> Result<Self> {
        let package_path = dir_path(&dir).join("package.json");
        let package = if index.exists(&package_path) {
            PackageJson::read(index, &package_path)?
        } else {
            PackageJson::default()
        };
        Ok(Self {
            yarn: uses_yarn(index, &dir),
            jasmine: package.has_dependency("jasmine") || package.has_dependency("jasmine-core"),
            karma: package.has_dependency("karma"),
            dir,
        })
    }

    pub fn descriptor(&self, platform: &str) -> ConfigDescriptor {
        ConfigDescriptor::new(platform)
            .with_if(self.yarn, ConfigFlag::Yarn)
            .with_if(self.jasmine, ConfigFlag::Jasmine)
            .with_if(self.karma, ConfigFlag::Karma)
    }
}

/// Environment keys and archive step of one web-hybrid flavour.
pub(super) struct HybridFlavor {
    pub name: &'static str,
    pub work_dir_env: &'static str,
    pub platform_env: &'static str,
    pub archive: fn(&str, &str) -> Step,
}

pub(super) const CORDOVA: HybridFlavor = HybridFlavor {
    name: SCANNER_NAME,
    work_dir_env: WORK_DIR_ENV,
    platform_env: PLATFORM_ENV,
    archive: steps::cordova_archive,
};

impl HybridFlavor {
    pub fn platform_node(&self, config: &str) -> OptionNode {
        let mut node = OptionNode::new(
            "Platform to build",
            "The native platforms the archive step builds",
            self.platform_env,
            OptionType::Selector,
        );
        for platform in TARGET_PLATFORMS {
            node.add_config(*platform, config);
        }
        node
    }

    pub fn tree(&self, projects: &[WebProject], descriptors: &mut Vec<ConfigDescriptor>) -> OptionNode {
        let mut root = OptionNode::new(
            "Directory of the project",
            "The directory containing config.xml and package.json",
            self.work_dir_env,
            OptionType::Selector,
        );
        for project in projects {
            let descriptor = project.descriptor(self.name);
            root.add_option(project.dir.clone(), self.platform_node(&descriptor.config_name()));
            descriptors.push(descriptor);
        }
        root
    }

    pub fn default_tree(&self) -> OptionNode {
        user_input(
            "Directory of the project",
            self.work_dir_env,
            self.platform_node(&default_config_name(self.name)),
        )
    }

    pub fn generate_config(&self, descriptor: &ConfigDescriptor, repo_access: RepoAccess) -> Result<String> {
        let workdir = format!("${}", self.work_dir_env);
        let mut prepare = vec![if descriptor.has(&ConfigFlag::Yarn) {
            steps::yarn(&workdir, "install")
        } else {
            steps::npm(&workdir, "install")
        }];
        if descriptor.has(&ConfigFlag::Karma) {
            prepare.push(steps::karma_jasmine_runner(&workdir));
        } else if descriptor.has(&ConfigFlag::Jasmine) {
            prepare.push(steps::jasmine_runner(&workdir));
        }

        let mut deploy = prepare.clone();
        deploy.push(steps::certificate_and_profile_installer());
        deploy.push(steps::generate_cordova_build_configuration());
        deploy.push((self.archive)(&workdir, &format!("${}", self.platform_env)));

        PipelineBuilder::new(self.name, repo_access)
            .workflow(PRIMARY_WORKFLOW, "Install dependencies and run your tests.", prepare)
            .workflow(DEPLOY_WORKFLOW, "Build the native apps for distribution.", deploy)
            .render()
    }

    pub fn configs(&self, descriptors: &[ConfigDescriptor], repo_access: RepoAccess) -> Result<ConfigMap> {
        let mut catalog = ConfigCatalog::new();
        for descriptor in descriptors {
            catalog.get_or_generate(descriptor, |d| self.generate_config(d, repo_access))?;
        }
        Ok(catalog.into_config_map())
    }

    pub fn default_configs(&self) -> Result<ConfigMap> {
        let descriptor = ConfigDescriptor::new(self.name);
        let mut configs = ConfigMap::new();
        configs.insert(
            default_config_name(self.name),
            self.generate_config(&descriptor, RepoAccess::Private)?,
        );
        Ok(configs)
    }
}

#[derive(Default)]
pub struct CordovaScanner {
    projects: Vec<WebProject>,
    descriptors: Vec<ConfigDescriptor>,
}

impl CordovaScanner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scanner for CordovaScanner {
    fn name(&self) -> &'static str {
        SCANNER_NAME
    }

    fn detect_platform(&mut self, search_dir: &Path) -> Result<bool> {
        let index = FileIndex::scan(search_dir)?;
        let mut dirs = Vec::new();
        for path in index.named("config.xml") {
            if index.read_to_string(path)?.contains("<widget") {
                dirs.push(display_dir(path));
            }
        }

        self.projects = outermost(dirs)
            .into_iter()
            .map(|dir| WebProject::inspect(&index, dir))
            .collect::<Result<_>>()?;
        debug!(projects = self.projects.len(), "Cordova projects found");
        Ok(!self.projects.is_empty())
    }

    fn options(&mut self) -> Result<ScannerOptions> {
        if self.projects.is_empty() {
            anyhow::bail!("No config.xml with a <widget> element found");
        }
        let mut descriptors = Vec::new();
        let root = CORDOVA.tree(&self.projects, &mut descriptors);
        self.descriptors = descriptors;
        Ok(ScannerOptions::new(root))
    }

    fn configs(&self, repo_access: RepoAccess) -> Result<ConfigMap> {
        CORDOVA.configs(&self.descriptors, repo_access)
    }

    fn default_options(&self) -> OptionNode {
        CORDOVA.default_tree()
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        CORDOVA.default_configs()
    }

    fn excluded_scanner_names(&self) -> Vec<&'static str> {
        vec!["ios", "android"]
    }
}
