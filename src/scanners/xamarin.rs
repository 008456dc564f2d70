//! Xamarin solutions

use super::files::{dir_path, display_dir, FileIndex};
use super::{user_input, Scanner, ScannerOptions};
use crate::models::{
    default_config_name, ConfigCatalog, ConfigDescriptor, ConfigFlag, ConfigMap, OptionNode,
    OptionType,
};
use crate::workflow::{steps, PipelineBuilder, RepoAccess, DEPLOY_WORKFLOW, PRIMARY_WORKFLOW};
use anyhow::Result;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

pub const SCANNER_NAME: &str = "xamarin";
pub const PROJECT_PATH_ENV: &str = "BITRISE_PROJECT_PATH";
pub const CONFIGURATION_ENV: &str = "BITRISE_XAMARIN_CONFIGURATION";
pub const PLATFORM_ENV: &str = "BITRISE_XAMARIN_PLATFORM";

const XAMARIN_MARKERS: &[&str] = &["Xamarin.iOS", "Xamarin.Android", "Mono.Android"];

fn project_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"Project\("\{[^}]+\}"\)\s*=\s*"[^"]*",\s*"(?P<path>[^"]+)""#)
            .expect("valid regex")
    })
}

fn configuration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(?P<config>[^|=\s][^|=]*?)\|(?P<platform>[^=]+?)\s*=").expect("valid regex")
    })
}

/// Relative paths of the projects a solution references, `/`-separated.
fn solution_projects(solution: &str) -> Vec<String> {
    project_pattern()
        .captures_iter(solution)
        .map(|c| c["path"].replace('\\', "/"))
        .collect()
}

/// Configuration → platforms, from `SolutionConfigurationPlatforms`.
fn solution_configurations(solution: &str) -> BTreeMap<String, BTreeSet<String>> {
    let mut configurations: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut in_section = false;
    for line in solution.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("GlobalSection(SolutionConfigurationPlatforms)") {
            in_section = true;
            continue;
        }
        if in_section && trimmed.starts_with("EndGlobalSection") {
            break;
        }
        if !in_section {
            continue;
        }
        if let Some(captures) = configuration_pattern().captures(line) {
            configurations
                .entry(captures["config"].trim().to_string())
                .or_default()
                .insert(captures["platform"].trim().to_string());
        }
    }
    configurations
}

#[derive(Debug, Clone)]
struct XamarinSolution {
    path: String,
    configurations: BTreeMap<String, BTreeSet<String>>,
    nuget: bool,
    components: bool,
}

impl XamarinSolution {
    fn descriptor(&self) -> ConfigDescriptor {
        ConfigDescriptor::new(SCANNER_NAME)
            .with_if(self.nuget, ConfigFlag::NugetPackages)
            .with_if(self.components, ConfigFlag::XamarinComponents)
    }
}

#[derive(Default)]
pub struct XamarinScanner {
    solutions: Vec<XamarinSolution>,
    descriptors: Vec<ConfigDescriptor>,
}

pub fn generate_config(descriptor: &ConfigDescriptor, repo_access: RepoAccess) -> Result<String> {
    let mut build = Vec::new();
    if descriptor.has(&ConfigFlag::NugetPackages) {
        build.push(steps::nuget_restore());
    }
    if descriptor.has(&ConfigFlag::XamarinComponents) {
        build.push(steps::xamarin_components_restore());
    }
    build.push(steps::xamarin_archive(
        &format!("${}", PROJECT_PATH_ENV),
        &format!("${}", CONFIGURATION_ENV),
        &format!("${}", PLATFORM_ENV),
    ));

    let mut deploy = vec![steps::certificate_and_profile_installer()];
    deploy.extend(build.clone());

    PipelineBuilder::new(SCANNER_NAME, repo_access)
        .workflow(PRIMARY_WORKFLOW, "Build your Xamarin solution.", build)
        .workflow(
            DEPLOY_WORKFLOW,
            "Sign and archive your Xamarin apps for distribution.",
            deploy,
        )
        .render()
}

impl XamarinScanner {
    pub fn new() -> Self {
        Self::default()
    }

    fn inspect(index: &FileIndex, path: &Path) -> Result<Option<XamarinSolution>> {
        let solution = index.read_to_string(path)?;
        let solution_dir = dir_path(&display_dir(path));

        let mut is_xamarin = false;
        let mut nuget = false;
        for project in solution_projects(&solution) {
            let project_path: PathBuf = solution_dir.join(&project);
            if !index.exists(&project_path) {
                // Solution folders and projects outside the walk depth.
                continue;
            }
            let content = index.read_to_string(&project_path)?;
            if XAMARIN_MARKERS.iter().any(|m| content.contains(m)) {
                is_xamarin = true;
            }
            let project_dir = dir_path(&display_dir(&project_path));
            if content.contains("<PackageReference") || index.exists(&project_dir.join("packages.config")) {
                nuget = true;
            }
        }
        if !is_xamarin {
            return Ok(None);
        }

        Ok(Some(XamarinSolution {
            path: path.to_string_lossy().to_string(),
            configurations: solution_configurations(&solution),
            nuget,
            components: index.exists(&solution_dir.join("Components")),
        }))
    }
}

impl Scanner for XamarinScanner {
    fn name(&self) -> &'static str {
        SCANNER_NAME
    }

    fn detect_platform(&mut self, search_dir: &Path) -> Result<bool> {
        let index = FileIndex::scan(search_dir)?;
        let mut solutions = Vec::new();
        for path in index.with_extension("sln") {
            if let Some(solution) = Self::inspect(&index, path)? {
                solutions.push(solution);
            }
        }
        debug!(solutions = solutions.len(), "Xamarin solutions found");
        self.solutions = solutions;
        Ok(!self.solutions.is_empty())
    }

    fn options(&mut self) -> Result<ScannerOptions> {
        let mut root = OptionNode::new(
            "Path to the Xamarin Solution file",
            "The .sln file that references your Xamarin projects",
            PROJECT_PATH_ENV,
            OptionType::Selector,
        );
        let mut warnings = Vec::new();
        let mut descriptors = Vec::new();

        for solution in &self.solutions {
            if solution.configurations.is_empty() {
                warn!(solution = %solution.path, "Solution has no configurations");
                warnings.push(format!("No configurations found in solution: {}", solution.path));
                continue;
            }
            let descriptor = solution.descriptor();
            let config = descriptor.config_name();

            let mut configurations = OptionNode::new(
                "Xamarin solution configuration",
                "The solution configuration to archive",
                CONFIGURATION_ENV,
                OptionType::Selector,
            );
            for (configuration, platforms) in &solution.configurations {
                let mut platform_node = OptionNode::new(
                    "Xamarin solution platform",
                    "The solution platform to archive",
                    PLATFORM_ENV,
                    OptionType::Selector,
                );
                for platform in platforms {
                    platform_node.add_config(platform.clone(), config.clone());
                }
                configurations.add_option(configuration.clone(), platform_node);
            }
            root.add_option(solution.path.clone(), configurations);
            descriptors.push(descriptor);
        }

        if descriptors.is_empty() {
            let path = self.solutions.first().map(|s| s.path.clone()).unwrap_or_default();
            anyhow::bail!("No projects found in solution: {}", path);
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
        user_input(
            "Path to the Xamarin Solution file",
            PROJECT_PATH_ENV,
            user_input(
                "Xamarin solution configuration",
                CONFIGURATION_ENV,
                user_input(
                    "Xamarin solution platform",
                    PLATFORM_ENV,
                    OptionNode::leaf(default_config_name(SCANNER_NAME)),
                ),
            ),
        )
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        let descriptor = ConfigDescriptor::new(SCANNER_NAME).with(ConfigFlag::NugetPackages);
        let mut configs = ConfigMap::new();
        configs.insert(
            default_config_name(SCANNER_NAME),
            generate_config(&descriptor, RepoAccess::Private)?,
        );
        Ok(configs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SOLUTION: &str = r#"
Microsoft Visual Studio Solution File, Format Version 12.00
Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "Demo.iOS", "Demo.iOS\Demo.iOS.csproj", "{11111111-1111-1111-1111-111111111111}"
EndProject
Project("{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}") = "Demo.Droid", "Demo.Droid\Demo.Droid.csproj", "{22222222-2222-2222-2222-222222222222}"
EndProject
Global
	GlobalSection(SolutionConfigurationPlatforms) = preSolution
		Debug|iPhone = Debug|iPhone
		Release|iPhone = Release|iPhone
		Release|Any CPU = Release|Any CPU
	EndGlobalSection
	GlobalSection(ProjectConfigurationPlatforms) = postSolution
		{11111111-1111-1111-1111-111111111111}.Debug|iPhone.ActiveCfg = Debug|iPhone
	EndGlobalSection
EndGlobal
"#;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn xamarin_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Demo.sln", SOLUTION);
        write(
            dir.path(),
            "Demo.iOS/Demo.iOS.csproj",
            r#"<Project><Reference Include="Xamarin.iOS" /></Project>"#,
        );
        write(
            dir.path(),
            "Demo.Droid/Demo.Droid.csproj",
            r#"<Project><Reference Include="Mono.Android" /><PackageReference Include="Xamarin.Essentials" /></Project>"#,
        );
        dir
    }

    #[test]
    fn test_solution_parsing() {
        assert_eq!(
            solution_projects(SOLUTION),
            vec!["Demo.iOS/Demo.iOS.csproj", "Demo.Droid/Demo.Droid.csproj"]
        );
        let configurations = solution_configurations(SOLUTION);
        assert_eq!(configurations.len(), 2);
        assert_eq!(
            configurations["Release"],
            BTreeSet::from(["Any CPU".to_string(), "iPhone".to_string()])
        );
        assert_eq!(configurations["Debug"], BTreeSet::from(["iPhone".to_string()]));
    }

    #[test]
    fn test_detects_and_builds_three_level_tree() {
        let repo = xamarin_repo();
        let mut scanner = XamarinScanner::new();
        assert!(scanner.detect_platform(repo.path()).unwrap());
        let options = scanner.options().unwrap();

        let configurations = options.root.child("Demo.sln").unwrap();
        assert_eq!(configurations.values(), vec!["Debug", "Release"]);
        let platforms = configurations.child("Release").unwrap();
        assert_eq!(platforms.env_key, PLATFORM_ENV);
        assert_eq!(
            platforms.child("iPhone").unwrap().config(),
            Some("xamarin-nuget-config")
        );

        let configs = scanner.configs(RepoAccess::Public).unwrap();
        assert!(configs
            .get("xamarin-nuget-config")
            .unwrap()
            .contains("nuget-restore@1"));
    }

    #[test]
    fn test_plain_dotnet_solution_not_detected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Demo.sln", SOLUTION);
        write(dir.path(), "Demo.iOS/Demo.iOS.csproj", "<Project />");
        let mut scanner = XamarinScanner::new();
        assert!(!scanner.detect_platform(dir.path()).unwrap());
    }
}
