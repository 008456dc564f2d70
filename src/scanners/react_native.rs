//! React Native projects (bare and Expo with native directories).

use super::files::{dir_path, display_dir, outermost, FileIndex};
use super::node::{uses_yarn, PackageJson};
use super::xcode::{DISTRIBUTION_METHOD_ENV, PROJECT_PATH_ENV, SCHEME_ENV};
use super::{user_input, Scanner, ScannerOptions};
use crate::models::{
    default_config_name, ConfigCatalog, ConfigDescriptor, ConfigFlag, ConfigMap, OptionNode,
    OptionType,
};
use crate::workflow::{steps, PipelineBuilder, RepoAccess, Step, DEPLOY_WORKFLOW, PRIMARY_WORKFLOW};
use anyhow::Result;
use std::path::Path;
use tracing::debug;

pub const SCANNER_NAME: &str = "react-native";
pub const WORKDIR_ENV: &str = "WORKDIR";

const DISTRIBUTION_METHODS: &[&str] = &["app-store", "ad-hoc", "enterprise", "development"];

#[derive(Debug, Clone)]
struct IosProject {
    /// Workspace or project path relative to the repository root.
    path: String,
    scheme: String,
}

#[derive(Debug, Clone)]
struct ReactNativeProject {
    dir: String,
    ios: Option<IosProject>,
    has_android: bool,
    yarn: bool,
    expo: bool,
    has_tests: bool,
}

impl ReactNativeProject {
    fn platform(&self) -> Option<&'static str> {
        match (self.ios.is_some(), self.has_android) {
            (true, true) => Some("both"),
            (true, false) => Some("ios"),
            (false, true) => Some("android"),
            (false, false) => None,
        }
    }

    fn descriptor(&self, platform: &str) -> ConfigDescriptor {
        ConfigDescriptor::new(SCANNER_NAME)
            .with_if(self.yarn, ConfigFlag::Yarn)
            .with_if(self.expo, ConfigFlag::Expo)
            .with_if(self.has_tests, ConfigFlag::HasTests)
            .with(ConfigFlag::Platform(platform.to_string()))
    }
}

#[derive(Default)]
pub struct ReactNativeScanner {
    projects: Vec<ReactNativeProject>,
    descriptors: Vec<ConfigDescriptor>,
}

/// Workspace preferred over project, directly inside `<dir>/ios`.
fn ios_project(index: &FileIndex, dir: &str) -> Option<IosProject> {
    let ios_dir = dir_path(dir).join("ios");
    let in_ios_dir = |p: &&Path| p.parent() == Some(ios_dir.as_path());
    let found = index
        .with_extension("xcworkspace")
        .into_iter()
        .find(in_ios_dir)
        .or_else(|| index.with_extension("xcodeproj").into_iter().find(in_ios_dir))?;
    Some(IosProject {
        path: found.to_string_lossy().to_string(),
        scheme: found
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default(),
    })
}

fn install_step(yarn: bool, workdir: &str) -> Step {
    if yarn {
        steps::yarn(workdir, "install")
    } else {
        steps::npm(workdir, "install")
    }
}

fn test_step(yarn: bool, workdir: &str) -> Step {
    if yarn {
        steps::yarn(workdir, "test")
    } else {
        steps::npm(workdir, "test")
    }
}

pub fn generate_config(descriptor: &ConfigDescriptor, repo_access: RepoAccess) -> Result<String> {
    let workdir = format!("${}", WORKDIR_ENV);
    let yarn = descriptor.has(&ConfigFlag::Yarn);
    let has_tests = descriptor.has(&ConfigFlag::HasTests);
    let platform = descriptor
        .flags
        .iter()
        .find_map(|f| match f {
            ConfigFlag::Platform(p) => Some(p.as_str()),
            _ => None,
        })
        .unwrap_or("both");

    let mut prepare = vec![install_step(yarn, &workdir)];
    if descriptor.has(&ConfigFlag::Expo) {
        prepare.push(steps::script("Expo doctor", "cd \"$WORKDIR\"\nnpx expo-doctor"));
    }
    if has_tests {
        prepare.push(test_step(yarn, &workdir));
    }

    let mut deploy = prepare.clone();
    if platform == "android" || platform == "both" {
        let android_dir = format!("{}/android", workdir);
        deploy.push(steps::install_missing_android_tools(&format!("{}/gradlew", android_dir)));
        deploy.push(steps::gradle_runner(&android_dir, "assembleRelease"));
        deploy.push(steps::sign_apk());
    }
    if platform == "ios" || platform == "both" {
        let project = format!("${}", PROJECT_PATH_ENV);
        deploy.push(steps::cocoapods_install());
        deploy.push(steps::certificate_and_profile_installer());
        deploy.push(steps::xcode_archive(
            &project,
            &format!("${}", SCHEME_ENV),
            &format!("${}", DISTRIBUTION_METHOD_ENV),
        ));
    }

    PipelineBuilder::new(SCANNER_NAME, repo_access)
        .workflow(PRIMARY_WORKFLOW, "Install dependencies and run your tests.", prepare)
        .workflow(
            DEPLOY_WORKFLOW,
            "Build the native apps for distribution.",
            deploy,
        )
        .render()
}

impl ReactNativeScanner {
    pub fn new() -> Self {
        Self::default()
    }

    fn distribution_node(config: &str) -> OptionNode {
        let mut node = OptionNode::new(
            "iOS distribution method",
            "The export method used to create the iOS app archive",
            DISTRIBUTION_METHOD_ENV,
            OptionType::Selector,
        );
        for method in DISTRIBUTION_METHODS {
            node.add_config(*method, config);
        }
        node
    }

    fn ios_branch(ios: &IosProject, config: &str) -> OptionNode {
        let mut scheme = OptionNode::new(
            "Scheme name",
            "The Xcode scheme of the iOS app",
            SCHEME_ENV,
            OptionType::Selector,
        );
        scheme.add_option(ios.scheme.clone(), Self::distribution_node(config));
        let mut project = OptionNode::new(
            "Project or Workspace path",
            "The Xcode workspace of the iOS app",
            PROJECT_PATH_ENV,
            OptionType::Selector,
        );
        project.add_option(ios.path.clone(), scheme);
        project
    }
}

impl Scanner for ReactNativeScanner {
    fn name(&self) -> &'static str {
        SCANNER_NAME
    }

    fn detect_platform(&mut self, search_dir: &Path) -> Result<bool> {
        let index = FileIndex::scan(search_dir)?;
        let mut dirs = Vec::new();
        let mut packages = Vec::new();
        for path in index.named("package.json") {
            let package = PackageJson::read(&index, path)?;
            if package.has_dependency("react-native") {
                let dir = display_dir(path);
                dirs.push(dir.clone());
                packages.push((dir, package));
            }
        }

        let dirs = outermost(dirs);
        self.projects = packages
            .into_iter()
            .filter(|(dir, _)| dirs.contains(dir))
            .map(|(dir, package)| ReactNativeProject {
                ios: ios_project(&index, &dir),
                has_android: index.exists(&dir_path(&dir).join("android")),
                yarn: uses_yarn(&index, &dir),
                expo: package.has_dependency("expo"),
                has_tests: package.has_script("test"),
                dir,
            })
            .collect();

        debug!(projects = self.projects.len(), "React Native projects found");
        Ok(!self.projects.is_empty())
    }

    fn options(&mut self) -> Result<ScannerOptions> {
        let mut root = OptionNode::new(
            "React Native project directory",
            "The directory containing the package.json of your app",
            WORKDIR_ENV,
            OptionType::Selector,
        );
        let mut warnings = Vec::new();
        let mut descriptors = Vec::new();

        for project in &self.projects {
            let platform = match project.platform() {
                Some(platform) => platform,
                None => {
                    warnings.push(format!(
                        "No ios or android directory found in project: {}",
                        project.dir
                    ));
                    continue;
                }
            };
            let descriptor = project.descriptor(platform);
            let config = descriptor.config_name();
            match &project.ios {
                Some(ios) => root.add_option(project.dir.clone(), Self::ios_branch(ios, &config)),
                None => root.add_config(project.dir.clone(), config),
            }
            descriptors.push(descriptor);
        }

        if descriptors.is_empty() {
            anyhow::bail!("No React Native project with an ios or android directory found");
        }
        self.descriptors = descriptors;

        Ok(ScannerOptions {
            root,
            warnings,
            icons: Vec::new(),
        })
    }

    fn configs(&self, repo_access: RepoAccess) -> Result<ConfigMap> {
        let mut catalog = ConfigCatalog::new();
        for descriptor in &self.descriptors {
            catalog.get_or_generate(descriptor, |d| generate_config(d, repo_access))?;
        }
        Ok(catalog.into_config_map())
    }

    fn default_options(&self) -> OptionNode {
        let config = default_config_name(SCANNER_NAME);
        user_input(
            "React Native project directory",
            WORKDIR_ENV,
            user_input(
                "Project or Workspace path",
                PROJECT_PATH_ENV,
                user_input("Scheme name", SCHEME_ENV, Self::distribution_node(&config)),
            ),
        )
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        let descriptor = ConfigDescriptor::new(SCANNER_NAME)
            .with(ConfigFlag::HasTests)
            .with(ConfigFlag::Platform("both".to_string()));
        let mut configs = ConfigMap::new();
        configs.insert(
            default_config_name(SCANNER_NAME),
            generate_config(&descriptor, RepoAccess::Private)?,
        );
        Ok(configs)
    }

    fn excluded_scanner_names(&self) -> Vec<&'static str> {
        vec!["ios", "android"]
    }
}
