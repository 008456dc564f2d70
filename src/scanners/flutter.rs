//! Flutter projects

use super::files::{dir_path, display_dir, FileIndex};
use super::{user_input, Scanner, ScannerOptions};
use crate::models::{
    default_config_name, ConfigCatalog, ConfigDescriptor, ConfigFlag, ConfigMap, Icon, OptionNode,
    OptionType,
};
use crate::workflow::{steps, PipelineBuilder, RepoAccess, DEPLOY_WORKFLOW, PRIMARY_WORKFLOW};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SCANNER_NAME: &str = "flutter";
pub const PROJECT_LOCATION_ENV: &str = "BITRISE_FLUTTER_PROJECT_LOCATION";

#[derive(Debug, Default, Deserialize)]
struct Pubspec {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_yaml::Value>,
}

impl Pubspec {
    /// `dependencies: flutter: sdk: flutter`
    fn depends_on_flutter_sdk(&self) -> bool {
        self.dependencies
            .get("flutter")
            .and_then(|dep| dep.get("sdk"))
            .and_then(|sdk| sdk.as_str())
            == Some("flutter")
    }
}

#[derive(Debug, Clone)]
struct FlutterProject {
    location: String,
    has_tests: bool,
    platform: &'static str,
    icon: Option<PathBuf>,
}

#[derive(Default)]
pub struct FlutterScanner {
    projects: Vec<FlutterProject>,
    descriptors: Vec<ConfigDescriptor>,
}

fn read_pubspec(index: &FileIndex, relative: &Path) -> Result<Pubspec> {
    let content = index.read_to_string(relative)?;
    // An empty pubspec parses to null.
    let pubspec: Option<Pubspec> = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse {}", relative.display()))?;
    Ok(pubspec.unwrap_or_default())
}

fn platform(has_ios: bool, has_android: bool) -> &'static str {
    match (has_ios, has_android) {
        (true, true) => "both",
        (true, false) => "ios",
        (false, true) => "android",
        (false, false) => "none",
    }
}

fn descriptor(has_tests: bool, platform: &str) -> ConfigDescriptor {
    ConfigDescriptor::new(SCANNER_NAME)
        .with_if(has_tests, ConfigFlag::HasTests)
        .with(ConfigFlag::Platform(platform.to_string()))
}

pub fn generate_config(descriptor: &ConfigDescriptor, repo_access: RepoAccess) -> Result<String> {
    let location = format!("${}", PROJECT_LOCATION_ENV);
    let platform = descriptor
        .flags
        .iter()
        .find_map(|f| match f {
            ConfigFlag::Platform(p) => Some(p.as_str()),
            _ => None,
        })
        .unwrap_or("none");

    let mut primary = vec![steps::flutter_installer(), steps::flutter_analyze(&location)];
    if descriptor.has(&ConfigFlag::HasTests) {
        primary.push(steps::flutter_test(&location));
    }

    let mut builder = PipelineBuilder::new(SCANNER_NAME, repo_access).workflow(
        PRIMARY_WORKFLOW,
        "Analyze and test your Flutter project.",
        primary.clone(),
    );
    if platform != "none" {
        let mut deploy = primary;
        if platform != "android" {
            deploy.push(steps::certificate_and_profile_installer());
        }
        deploy.push(steps::flutter_build(&location, platform));
        builder = builder.workflow(
            DEPLOY_WORKFLOW,
            "Build your Flutter app for distribution.",
            deploy,
        );
    }
    builder.render()
}

impl FlutterScanner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scanner for FlutterScanner {
    fn name(&self) -> &'static str {
        SCANNER_NAME
    }

    fn detect_platform(&mut self, search_dir: &Path) -> Result<bool> {
        let index = FileIndex::scan(search_dir)?;
        let mut projects = Vec::new();
        for path in index.named("pubspec.yaml") {
            if !read_pubspec(&index, path)?.depends_on_flutter_sdk() {
                continue;
            }
            let location = display_dir(path);
            let dir = dir_path(&location);
            let icon = dir.join("assets/icon/icon.png");
            projects.push(FlutterProject {
                has_tests: index.exists(&dir.join("test")),
                platform: platform(
                    index.exists(&dir.join("ios")),
                    index.exists(&dir.join("android")),
                ),
                icon: index.exists(&icon).then(|| index.absolute(&icon)),
                location,
            });
        }

        debug!(projects = projects.len(), "Flutter projects found");
        self.projects = projects;
        Ok(!self.projects.is_empty())
    }

    fn options(&mut self) -> Result<ScannerOptions> {
        let mut root = OptionNode::new(
            "Project location",
            "The directory containing the pubspec.yaml of your Flutter project",
            PROJECT_LOCATION_ENV,
            OptionType::Selector,
        );
        let mut icons = Vec::new();
        let mut descriptors = Vec::new();
        for project in &self.projects {
            let descriptor = descriptor(project.has_tests, project.platform);
            root.add_config(project.location.clone(), descriptor.config_name());
            descriptors.push(descriptor);
            if let Some(icon) = &project.icon {
                icons.push(Icon::from_path(icon));
            }
        }
        if descriptors.is_empty() {
            anyhow::bail!("No Flutter projects found");
        }
        self.descriptors = descriptors;

        Ok(ScannerOptions {
            root,
            warnings: Vec::new(),
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
            "Project location",
            PROJECT_LOCATION_ENV,
            OptionNode::leaf(default_config_name(SCANNER_NAME)),
        )
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        let mut configs = ConfigMap::new();
        configs.insert(
            default_config_name(SCANNER_NAME),
            generate_config(&descriptor(true, "both"), RepoAccess::Private)?,
        );
        Ok(configs)
    }

    fn excluded_scanner_names(&self) -> Vec<&'static str> {
        vec!["ios", "android"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const PUBSPEC: &str = "name: demo\ndependencies:\n  flutter:\n    sdk: flutter\n";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_detects_flutter_sdk_dependency() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app/pubspec.yaml", PUBSPEC);
        write(dir.path(), "app/test/widget_test.dart", "");
        write(dir.path(), "app/ios/Runner/Info.plist", "");
        write(dir.path(), "app/android/build.gradle", "");

        let mut scanner = FlutterScanner::new();
        assert!(scanner.detect_platform(dir.path()).unwrap());
        let options = scanner.options().unwrap();
        assert_eq!(
            options.root.child("app").unwrap().config(),
            Some("flutter-test-both-config")
        );

        let configs = scanner.configs(RepoAccess::Public).unwrap();
        let text = configs.get("flutter-test-both-config").unwrap();
        assert!(text.contains("flutter-test@1"));
        assert!(text.contains("flutter-build@0"));
    }

    #[test]
    fn test_dart_package_is_not_flutter() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pubspec.yaml", "name: lib\ndependencies:\n  http: ^1.0.0\n");
        let mut scanner = FlutterScanner::new();
        assert!(!scanner.detect_platform(dir.path()).unwrap());
    }

    #[test]
    fn test_invalid_pubspec_fails_detection() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pubspec.yaml", "dependencies: [unterminated");
        let mut scanner = FlutterScanner::new();
        let err = scanner.detect_platform(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to parse pubspec.yaml"));
    }

    #[test]
    fn test_no_native_platform_skips_deploy() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pubspec.yaml", PUBSPEC);
        let mut scanner = FlutterScanner::new();
        scanner.detect_platform(dir.path()).unwrap();
        let options = scanner.options().unwrap();
        assert_eq!(options.root.config_names(), vec!["flutter-none-config".to_string()]);
        let configs = scanner.configs(RepoAccess::Public).unwrap();
        assert!(!configs.get("flutter-none-config").unwrap().contains("deploy:"));
    }
}
