//! Xcode projects, shared by the iOS and macOS scanners.
//!
//! Both scanners walk the same `.xcodeproj` bundles and keep the ones whose
//! `SDKROOT` matches their platform.

use super::files::{dir_path, display_dir, FileIndex};
use super::{user_input, Scanner, ScannerOptions};
use crate::models::{
    default_config_name, ConfigCatalog, ConfigDescriptor, ConfigFlag, ConfigMap, Icon, OptionNode,
    OptionType,
};
use crate::workflow::{steps, PipelineBuilder, RepoAccess, Step, DEPLOY_WORKFLOW, PRIMARY_WORKFLOW};
use anyhow::Result;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

pub const PROJECT_PATH_ENV: &str = "BITRISE_PROJECT_PATH";
pub const SCHEME_ENV: &str = "BITRISE_SCHEME";
pub const DISTRIBUTION_METHOD_ENV: &str = "BITRISE_DISTRIBUTION_METHOD";
pub const EXPORT_METHOD_ENV: &str = "BITRISE_EXPORT_METHOD";

const IOS_METHODS: &[&str] = &["app-store", "ad-hoc", "enterprise", "development"];
const MACOS_METHODS: &[&str] = &["app-store", "developer-id", "development", "none"];
const APP_CLIP_PRODUCT_TYPE: &str = "com.apple.product-type.application.on-demand-install-capable";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XcodeProjectType {
    Ios,
    MacOs,
}

impl XcodeProjectType {
    pub fn name(&self) -> &'static str {
        match self {
            XcodeProjectType::Ios => "ios",
            XcodeProjectType::MacOs => "macos",
        }
    }

    fn sdk(&self) -> &'static str {
        match self {
            XcodeProjectType::Ios => "iphoneos",
            XcodeProjectType::MacOs => "macosx",
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            XcodeProjectType::Ios => "iOS",
            XcodeProjectType::MacOs => "macOS",
        }
    }

    fn method_env(&self) -> &'static str {
        match self {
            XcodeProjectType::Ios => DISTRIBUTION_METHOD_ENV,
            XcodeProjectType::MacOs => EXPORT_METHOD_ENV,
        }
    }

    fn methods(&self) -> &'static [&'static str] {
        match self {
            XcodeProjectType::Ios => IOS_METHODS,
            XcodeProjectType::MacOs => MACOS_METHODS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct XcodeScheme {
    name: String,
    has_tests: bool,
}

#[derive(Debug, Clone)]
struct XcodeProject {
    /// Workspace when one sits next to the project, else the project itself.
    path: String,
    bundle: PathBuf,
    has_podfile: bool,
    carthage: Option<String>,
    has_app_clip: bool,
}

pub struct XcodeScanner {
    project_type: XcodeProjectType,
    index: Option<FileIndex>,
    projects: Vec<XcodeProject>,
    descriptors: Vec<ConfigDescriptor>,
}

fn sdkroot_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"SDKROOT = (\w+);").expect("valid regex"))
}

/// Every `SDKROOT` value a pbxproj declares.
fn sdk_roots(pbxproj: &str) -> Vec<String> {
    sdkroot_pattern()
        .captures_iter(pbxproj)
        .map(|c| c[1].to_string())
        .collect()
}

impl XcodeScanner {
    pub fn new(project_type: XcodeProjectType) -> Self {
        Self {
            project_type,
            index: None,
            projects: Vec::new(),
            descriptors: Vec::new(),
        }
    }

    /// Schemes stored inside the `.xcodeproj` bundle, which is walked on its
    /// own since scheme files sit several levels below the bundle root.
    fn schemes(index: &FileIndex, bundle: &Path, shared: bool) -> Result<Vec<XcodeScheme>> {
        let marker = if shared { "xcshareddata" } else { "xcuserdata" };
        let contents = FileIndex::scan_bundle(&index.absolute(bundle))?;
        let mut schemes = Vec::new();
        for path in contents.with_extension("xcscheme") {
            if !path.components().any(|c| c.as_os_str() == marker) {
                continue;
            }
            let content = contents.read_to_string(path)?;
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            schemes.push(XcodeScheme {
                name,
                has_tests: content.contains("<TestableReference"),
            });
        }
        schemes.sort_by(|a, b| a.name.cmp(&b.name));
        schemes.dedup_by(|a, b| a.name == b.name);
        Ok(schemes)
    }

    fn app_icon(index: &FileIndex, project_dir: &Path) -> Option<PathBuf> {
        let project = FileIndex::scan(&index.absolute(project_dir)).ok()?;
        project
            .with_extension("png")
            .into_iter()
            .filter(|p| {
                p.parent()
                    .and_then(|d| d.extension())
                    .map_or(false, |e| e == "appiconset")
            })
            .map(|p| project.absolute(p))
            .max_by_key(|p| std::fs::metadata(p).map(|m| m.len()).unwrap_or(0))
    }

    fn method_node(&self, config: &str) -> OptionNode {
        let mut node = OptionNode::new(
            format!("{} distribution method", self.project_type.display_name()),
            "The export method used to create the app archive",
            self.project_type.method_env(),
            OptionType::Selector,
        );
        for method in self.project_type.methods() {
            node.add_config(*method, config);
        }
        node
    }

    fn generate_config(&self, descriptor: &ConfigDescriptor, repo_access: RepoAccess) -> Result<String> {
        let project = format!("${}", PROJECT_PATH_ENV);
        let scheme = format!("${}", SCHEME_ENV);
        let method = format!("${}", self.project_type.method_env());

        let mut prepare: Vec<Step> = Vec::new();
        if let Some(ConfigFlag::Carthage(command)) = descriptor
            .flags
            .iter()
            .find(|f| matches!(f, ConfigFlag::Carthage(_)))
        {
            prepare.push(steps::carthage(command));
        }
        if descriptor.has(&ConfigFlag::HasPodfile) {
            prepare.push(steps::cocoapods_install());
        }
        if descriptor.has(&ConfigFlag::MissingSharedSchemes) {
            prepare.push(steps::recreate_user_schemes(&project));
        }
        let has_tests = descriptor.has(&ConfigFlag::HasTests);

        let (primary, deploy) = match self.project_type {
            XcodeProjectType::Ios => {
                let mut primary = prepare.clone();
                primary.push(if has_tests {
                    steps::xcode_test(&project, &scheme)
                } else {
                    steps::xcode_build_for_simulator(&project, &scheme)
                });

                let mut deploy = prepare;
                if has_tests {
                    deploy.push(steps::xcode_test(&project, &scheme));
                }
                deploy.push(steps::xcode_archive(&project, &scheme, &method));
                if descriptor.has(&ConfigFlag::HasAppClip) {
                    deploy.push(steps::export_app_clip(&method));
                }
                (primary, deploy)
            }
            XcodeProjectType::MacOs => {
                let mut primary = prepare.clone();
                if has_tests {
                    primary.push(steps::xcode_test_mac(&project, &scheme));
                }
                let mut deploy = prepare;
                if has_tests {
                    deploy.push(steps::xcode_test_mac(&project, &scheme));
                }
                deploy.push(steps::xcode_archive_mac(&project, &scheme, &method));
                (primary, deploy)
            }
        };

        let mut deploy_steps = vec![steps::certificate_and_profile_installer()];
        deploy_steps.extend(deploy);

        PipelineBuilder::new(self.project_type.name(), repo_access)
            .workflow(PRIMARY_WORKFLOW, "Build and test your app.", primary)
            .workflow(
                DEPLOY_WORKFLOW,
                "Archive and export your app for distribution.",
                deploy_steps,
            )
            .render()
    }
}

impl Scanner for XcodeScanner {
    fn name(&self) -> &'static str {
        self.project_type.name()
    }

    fn detect_platform(&mut self, search_dir: &Path) -> Result<bool> {
        let index = FileIndex::scan(search_dir)?;
        let mut projects = Vec::new();

        for bundle in index.with_extension("xcodeproj") {
            let pbxproj = index.read_to_string(&bundle.join("project.pbxproj"))?;
            if !sdk_roots(&pbxproj).iter().any(|sdk| sdk == self.project_type.sdk()) {
                continue;
            }

            let dir = display_dir(bundle);
            let project_dir = dir_path(&dir);
            let workspace = bundle.with_extension("xcworkspace");
            let path = if index.exists(&workspace) {
                workspace.to_string_lossy().to_string()
            } else {
                bundle.to_string_lossy().to_string()
            };

            let has_podfile = index.exists(&project_dir.join("Podfile")) || index.exists(Path::new("Podfile"));
            let cartfile_dir = if index.exists(&project_dir.join("Cartfile")) {
                Some(project_dir.clone())
            } else if index.exists(Path::new("Cartfile")) {
                Some(PathBuf::new())
            } else {
                None
            };
            let carthage = cartfile_dir.map(|d| {
                if index.exists(&d.join("Cartfile.resolved")) {
                    "bootstrap".to_string()
                } else {
                    "update".to_string()
                }
            });

            projects.push(XcodeProject {
                path,
                bundle: bundle.to_path_buf(),
                has_podfile,
                carthage,
                has_app_clip: self.project_type == XcodeProjectType::Ios
                    && pbxproj.contains(APP_CLIP_PRODUCT_TYPE),
            });
        }

        debug!(
            project_type = self.project_type.name(),
            projects = projects.len(),
            "Xcode projects found"
        );
        self.projects = projects;
        self.index = Some(index);
        Ok(!self.projects.is_empty())
    }

    fn options(&mut self) -> Result<ScannerOptions> {
        let index = match &self.index {
            Some(index) => index,
            None => anyhow::bail!("No {} projects found", self.project_type.display_name()),
        };

        let mut root = OptionNode::new(
            "Project or Workspace path",
            "The location of your Xcode project or workspace",
            PROJECT_PATH_ENV,
            OptionType::Selector,
        );
        let mut warnings = Vec::new();
        let mut icons = Vec::new();
        let mut descriptors = Vec::new();
        let mut first_without_schemes = None;

        for project in &self.projects {
            let mut schemes = Self::schemes(index, &project.bundle, true)?;
            let missing_shared = schemes.is_empty();
            if missing_shared {
                schemes = Self::schemes(index, &project.bundle, false)?;
                if schemes.is_empty() {
                    warnings.push(format!("No schemes found for project: {}", project.path));
                    first_without_schemes.get_or_insert_with(|| project.path.clone());
                    continue;
                }
                warnings.push(format!(
                    "No shared schemes found for project: {}. Automatically generated schemes may differ from the ones in your project. Make sure to share your schemes to have the expected behaviour.",
                    project.path
                ));
            }

            let mut scheme_node = OptionNode::new(
                "Scheme name",
                "An Xcode scheme defines a collection of targets to build",
                SCHEME_ENV,
                OptionType::Selector,
            );
            for scheme in &schemes {
                let descriptor = ConfigDescriptor::new(self.project_type.name())
                    .with_if(project.has_podfile, ConfigFlag::HasPodfile)
                    .with_if(scheme.has_tests, ConfigFlag::HasTests)
                    .with_if(project.has_app_clip, ConfigFlag::HasAppClip)
                    .with_if(missing_shared, ConfigFlag::MissingSharedSchemes);
                let descriptor = match &project.carthage {
                    Some(command) => descriptor.with(ConfigFlag::Carthage(command.clone())),
                    None => descriptor,
                };
                scheme_node.add_option(scheme.name.clone(), self.method_node(&descriptor.config_name()));
                descriptors.push(descriptor);
            }
            root.add_option(project.path.clone(), scheme_node);

            if let Some(icon) = Self::app_icon(index, &dir_path(&display_dir(&project.bundle))) {
                icons.push(Icon::from_path(icon));
            }
        }

        if descriptors.is_empty() {
            let project = first_without_schemes.unwrap_or_default();
            anyhow::bail!("No schemes found for project: {}", project);
        }

        self.descriptors = descriptors;
        Ok(ScannerOptions {
            root,
            warnings,
            icons,
        })
    }

    fn configs(&self, repo_access: RepoAccess) -> Result<ConfigMap> {
        let mut catalog = ConfigCatalog::new();
        for descriptor in &self.descriptors {
            catalog.get_or_generate(descriptor, |d| self.generate_config(d, repo_access))?;
        }
        Ok(catalog.into_config_map())
    }

    fn default_options(&self) -> OptionNode {
        user_input(
            "Project or Workspace path",
            PROJECT_PATH_ENV,
            user_input(
                "Scheme name",
                SCHEME_ENV,
                self.method_node(&default_config_name(self.project_type.name())),
            ),
        )
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        let descriptor = ConfigDescriptor::new(self.project_type.name())
            .with(ConfigFlag::HasPodfile)
            .with(ConfigFlag::HasTests);
        let mut configs = ConfigMap::new();
        configs.insert(
            default_config_name(self.project_type.name()),
            self.generate_config(&descriptor, RepoAccess::Private)?,
        );
        Ok(configs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SCHEME_WITH_TESTS: &str = r#"<Scheme><TestAction><Testables><TestableReference skipped="NO"></TestableReference></Testables></TestAction></Scheme>"#;
    const SCHEME_WITHOUT_TESTS: &str = "<Scheme><TestAction></TestAction></Scheme>";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn xcode_repo(sdk: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "App.xcodeproj/project.pbxproj",
            &format!("buildSettings = {{ SDKROOT = {}; }};", sdk),
        );
        write(
            dir.path(),
            "App.xcodeproj/xcshareddata/xcschemes/App.xcscheme",
            SCHEME_WITH_TESTS,
        );
        write(
            dir.path(),
            "App.xcodeproj/xcshareddata/xcschemes/AppStaging.xcscheme",
            SCHEME_WITH_TESTS,
        );
        write(
            dir.path(),
            "App.xcodeproj/xcshareddata/xcschemes/Widget.xcscheme",
            SCHEME_WITHOUT_TESTS,
        );
        dir
    }

    #[test]
    fn test_sdk_roots() {
        let roots = sdk_roots("SDKROOT = iphoneos;\nfoo\nSDKROOT = macosx;");
        assert_eq!(roots, vec!["iphoneos".to_string(), "macosx".to_string()]);
    }

    #[test]
    fn test_ios_detected_macos_not() {
        let repo = xcode_repo("iphoneos");
        assert!(XcodeScanner::new(XcodeProjectType::Ios)
            .detect_platform(repo.path())
            .unwrap());
        assert!(!XcodeScanner::new(XcodeProjectType::MacOs)
            .detect_platform(repo.path())
            .unwrap());
    }

    #[test]
    fn test_schemes_with_same_flags_share_config() {
        let repo = xcode_repo("iphoneos");
        let mut scanner = XcodeScanner::new(XcodeProjectType::Ios);
        scanner.detect_platform(repo.path()).unwrap();
        let options = scanner.options().unwrap();

        let schemes = options.root.child("App.xcodeproj").unwrap();
        assert_eq!(schemes.values(), vec!["App", "AppStaging", "Widget"]);

        let config_of = |scheme: &str| {
            schemes
                .child(scheme)
                .unwrap()
                .child("app-store")
                .unwrap()
                .config()
                .unwrap()
                .to_string()
        };
        assert_eq!(config_of("App"), "ios-test-config");
        assert_eq!(config_of("AppStaging"), "ios-test-config");
        assert_eq!(config_of("Widget"), "ios-config");

        let configs = scanner.configs(RepoAccess::Public).unwrap();
        assert_eq!(configs.names(), vec!["ios-config", "ios-test-config"]);
        assert!(configs.get("ios-test-config").unwrap().contains("xcode-test@5"));
        assert!(!configs.get("ios-config").unwrap().contains("xcode-test@5"));
    }

    #[test]
    fn test_podfile_and_workspace() {
        let repo = xcode_repo("iphoneos");
        write(repo.path(), "Podfile", "platform :ios\n");
        write(repo.path(), "App.xcworkspace/contents.xcworkspacedata", "<Workspace/>");
        let mut scanner = XcodeScanner::new(XcodeProjectType::Ios);
        scanner.detect_platform(repo.path()).unwrap();
        let options = scanner.options().unwrap();
        assert_eq!(options.root.values(), vec!["App.xcworkspace"]);
        assert!(options
            .root
            .config_names()
            .contains(&"ios-pod-test-config".to_string()));
    }

    #[test]
    fn test_user_schemes_flag_missing_shared() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Mac.xcodeproj/project.pbxproj", "SDKROOT = macosx;");
        write(
            dir.path(),
            "Mac.xcodeproj/xcuserdata/me.xcuserdatad/xcschemes/Mac.xcscheme",
            SCHEME_WITHOUT_TESTS,
        );
        let mut scanner = XcodeScanner::new(XcodeProjectType::MacOs);
        assert!(scanner.detect_platform(dir.path()).unwrap());
        let options = scanner.options().unwrap();
        assert_eq!(options.warnings.len(), 1);
        assert_eq!(
            options.root.config_names(),
            vec!["macos-missing-shared-schemes-config".to_string()]
        );
        let method = options.root.child("Mac.xcodeproj").unwrap().child("Mac").unwrap();
        assert_eq!(method.env_key, EXPORT_METHOD_ENV);
        assert_eq!(method.values().len(), MACOS_METHODS.len());
    }

    #[test]
    fn test_deeply_nested_project_schemes() {
        let dir = TempDir::new().unwrap();
        let bundle = "apps/mobile/ios/App.xcodeproj";
        write(dir.path(), &format!("{}/project.pbxproj", bundle), "SDKROOT = iphoneos;");
        write(
            dir.path(),
            &format!("{}/xcshareddata/xcschemes/App.xcscheme", bundle),
            SCHEME_WITH_TESTS,
        );
        write(
            dir.path(),
            "apps/mobile/ios/App/Assets.xcassets/AppIcon.appiconset/icon-1024.png",
            "png",
        );

        let mut scanner = XcodeScanner::new(XcodeProjectType::Ios);
        assert!(scanner.detect_platform(dir.path()).unwrap());
        let options = scanner.options().unwrap();
        assert!(options.warnings.is_empty());
        assert_eq!(options.root.values(), vec![bundle]);
        assert_eq!(
            options.root.child(bundle).unwrap().values(),
            vec!["App"]
        );
        assert_eq!(options.root.config_names(), vec!["ios-test-config".to_string()]);
        assert_eq!(options.icons.len(), 1);
    }

    #[test]
    fn test_no_schemes_fails_options() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "App.xcodeproj/project.pbxproj", "SDKROOT = iphoneos;");
        let mut scanner = XcodeScanner::new(XcodeProjectType::Ios);
        assert!(scanner.detect_platform(dir.path()).unwrap());
        let err = scanner.options().unwrap_err();
        assert_eq!(err.to_string(), "No schemes found for project: App.xcodeproj");
    }
}
