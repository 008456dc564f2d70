//! Android (Gradle) projects

use super::files::{dir_path, display_dir, outermost, FileIndex};
use super::{user_input, Scanner, ScannerOptions};
use crate::models::{
    default_config_name, ConfigCatalog, ConfigDescriptor, ConfigMap, Icon, OptionNode, OptionType,
};
use crate::workflow::{steps, PipelineBuilder, RepoAccess, DEPLOY_WORKFLOW, PRIMARY_WORKFLOW};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SCANNER_NAME: &str = "android";

const BUILD_FILES: &[&str] = &["build.gradle", "build.gradle.kts"];
const GRADLE_TASKS: &[&str] = &["assembleDebug", "assembleRelease", "bundleRelease"];
/// Launcher icon densities, best first.
const ICON_DENSITIES: &[&str] = &["xxxhdpi", "xxhdpi", "xhdpi", "hdpi", "mdpi"];

pub const PROJECT_LOCATION_ENV: &str = "PROJECT_LOCATION";
pub const GRADLE_TASK_ENV: &str = "GRADLE_TASK";

#[derive(Debug, Clone)]
struct AndroidProject {
    location: String,
    has_gradlew: bool,
    icon: Option<PathBuf>,
}

#[derive(Default)]
pub struct AndroidScanner {
    projects: Vec<AndroidProject>,
    descriptors: Vec<ConfigDescriptor>,
}

impl AndroidScanner {
    pub fn new() -> Self {
        Self::default()
    }

    fn descriptor() -> ConfigDescriptor {
        ConfigDescriptor::new(SCANNER_NAME)
    }

    fn task_node(config: &str) -> OptionNode {
        let mut tasks = OptionNode::new(
            "Gradle task",
            "The Gradle task that builds the app for distribution",
            GRADLE_TASK_ENV,
            OptionType::Selector,
        );
        for task in GRADLE_TASKS {
            tasks.add_config(*task, config);
        }
        tasks
    }
}

fn launcher_icon(index: &FileIndex, location: &str) -> Option<PathBuf> {
    let base = dir_path(location);
    ICON_DENSITIES.iter().find_map(|density| {
        let dir = format!("mipmap-{}", density);
        index
            .named("ic_launcher.png")
            .into_iter()
            .find(|p| {
                p.starts_with(&base)
                    && p.parent()
                        .and_then(|d| d.file_name())
                        .map_or(false, |d| d.to_string_lossy() == dir)
            })
            .map(|p| index.absolute(p))
    })
}

pub fn generate_config(_descriptor: &ConfigDescriptor, repo_access: RepoAccess) -> Result<String> {
    let location = format!("${}", PROJECT_LOCATION_ENV);
    let gradlew = format!("{}/gradlew", location);
    PipelineBuilder::new(SCANNER_NAME, repo_access)
        .workflow(
            PRIMARY_WORKFLOW,
            "Run your Android unit tests and get the test report.",
            vec![
                steps::restore_cache("gradle-{{ checksum \"**/*.gradle*\" }}"),
                steps::install_missing_android_tools(&gradlew),
                steps::android_unit_test(&location),
                steps::save_cache("gradle-{{ checksum \"**/*.gradle*\" }}", "~/.gradle"),
            ],
        )
        .workflow(
            DEPLOY_WORKFLOW,
            "Build and sign your Android app for distribution.",
            vec![
                steps::install_missing_android_tools(&gradlew),
                steps::android_unit_test(&location),
                steps::gradle_runner(&location, &format!("${}", GRADLE_TASK_ENV)),
                steps::sign_apk(),
            ],
        )
        .render()
}

impl Scanner for AndroidScanner {
    fn name(&self) -> &'static str {
        SCANNER_NAME
    }

    fn detect_platform(&mut self, search_dir: &Path) -> Result<bool> {
        let index = FileIndex::scan(search_dir)?;
        let dirs: Vec<String> = BUILD_FILES
            .iter()
            .flat_map(|name| index.named(name))
            .map(display_dir)
            .collect();

        self.projects = outermost(dirs)
            .into_iter()
            .map(|location| {
                let has_gradlew = index.exists(&dir_path(&location).join("gradlew"));
                let icon = launcher_icon(&index, &location);
                AndroidProject {
                    location,
                    has_gradlew,
                    icon,
                }
            })
            .collect();

        debug!(projects = self.projects.len(), "Android projects found");
        Ok(!self.projects.is_empty())
    }

    fn options(&mut self) -> Result<ScannerOptions> {
        let mut warnings = Vec::new();
        let usable: Vec<&AndroidProject> = self
            .projects
            .iter()
            .filter(|project| {
                if !project.has_gradlew {
                    warnings.push(format!(
                        "No Gradle Wrapper (gradlew) found in project: {}",
                        project.location
                    ));
                }
                project.has_gradlew
            })
            .collect();

        if usable.is_empty() {
            anyhow::bail!("No Gradle Wrapper (gradlew) found.");
        }

        let descriptor = Self::descriptor();
        let config = descriptor.config_name();
        let mut root = OptionNode::new(
            "The root directory of an Android project",
            "The directory containing the gradlew script and the top-level build.gradle",
            PROJECT_LOCATION_ENV,
            OptionType::Selector,
        );
        let mut icons = Vec::new();
        for project in &usable {
            root.add_option(project.location.clone(), Self::task_node(&config));
            if let Some(icon) = &project.icon {
                icons.push(Icon::from_path(icon));
            }
        }
        self.descriptors = vec![descriptor];

        Ok(ScannerOptions {
            root,
            warnings,
            icons,
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
        user_input(
            "The root directory of an Android project",
            PROJECT_LOCATION_ENV,
            user_input(
                "Gradle task",
                GRADLE_TASK_ENV,
                OptionNode::leaf(default_config_name(SCANNER_NAME)),
            ),
        )
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        let mut configs = ConfigMap::new();
        configs.insert(
            default_config_name(SCANNER_NAME),
            generate_config(&Self::descriptor(), RepoAccess::Private)?,
        );
        Ok(configs)
    }
}
