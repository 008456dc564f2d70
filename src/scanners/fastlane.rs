//! fastlane lanes. A tool scanner: its configs depend on which project
//! platforms the first pass detected.

use super::files::{display_dir, FileIndex};
use super::{user_input, DetectedPlatforms, Scanner, ScannerOptions, ToolScanner};
use crate::models::{
    default_config_name, ConfigCatalog, ConfigDescriptor, ConfigFlag, ConfigMap, OptionNode,
    OptionType,
};
use crate::workflow::{steps, PipelineBuilder, RepoAccess, PRIMARY_WORKFLOW};
use anyhow::Result;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

pub const SCANNER_NAME: &str = "fastlane";
pub const WORK_DIR_ENV: &str = "FASTLANE_WORK_DIR";
pub const LANE_ENV: &str = "FASTLANE_LANE";

fn lane_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\s*lane\s+:(?P<name>\w+)").expect("valid regex"))
}

fn platform_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^platform\s+:(?P<name>\w+)\s+do").expect("valid regex"))
}

/// Lane names as fastlane expects them on the command line: lanes inside a
/// `platform :x do` block are prefixed with the platform.
fn parse_lanes(fastfile: &str) -> Vec<String> {
    let mut platform: Option<String> = None;
    let mut lanes = Vec::new();
    for line in fastfile.lines() {
        if let Some(captures) = platform_pattern().captures(line) {
            platform = Some(captures["name"].to_string());
        } else if line.starts_with("end") {
            platform = None;
        } else if let Some(captures) = lane_pattern().captures(line) {
            let lane = &captures["name"];
            lanes.push(match &platform {
                Some(platform) => format!("{} {}", platform, lane),
                None => lane.to_string(),
            });
        }
    }
    lanes
}

#[derive(Debug, Clone)]
struct Fastfile {
    path: String,
    work_dir: String,
    lanes: Vec<String>,
}

#[derive(Default)]
pub struct FastlaneScanner {
    detected: DetectedPlatforms,
    fastfiles: Vec<Fastfile>,
    descriptors: Vec<ConfigDescriptor>,
}

impl FastlaneScanner {
    pub fn new() -> Self {
        Self::default()
    }

    fn descriptor(&self) -> ConfigDescriptor {
        let descriptor = ConfigDescriptor::new(SCANNER_NAME);
        match self.detected.names() {
            [only] => descriptor.with(ConfigFlag::ProjectType(only.clone())),
            _ => descriptor,
        }
    }
}

pub fn generate_config(descriptor: &ConfigDescriptor, repo_access: RepoAccess) -> Result<String> {
    let project_type = descriptor
        .flags
        .iter()
        .find_map(|f| match f {
            ConfigFlag::ProjectType(kind) => Some(kind.as_str()),
            _ => None,
        })
        .unwrap_or("other");

    let mut body = Vec::new();
    if matches!(project_type, "ios" | "macos" | "react-native" | "flutter") {
        body.push(steps::certificate_and_profile_installer());
    }
    body.push(steps::fastlane(
        &format!("${}", LANE_ENV),
        &format!("${}", WORK_DIR_ENV),
    ));

    PipelineBuilder::new(project_type, repo_access)
        .workflow(PRIMARY_WORKFLOW, "Run your fastlane lane.", body)
        .render()
}

impl Scanner for FastlaneScanner {
    fn name(&self) -> &'static str {
        SCANNER_NAME
    }

    fn detect_platform(&mut self, search_dir: &Path) -> Result<bool> {
        let index = FileIndex::scan(search_dir)?;
        let mut fastfiles = Vec::new();
        for path in index.named("Fastfile") {
            let fastlane_dir = match path.parent() {
                Some(dir) if dir.file_name().map_or(false, |n| n == "fastlane") => dir,
                _ => continue,
            };
            let content = index.read_to_string(path)?;
            fastfiles.push(Fastfile {
                path: path.to_string_lossy().to_string(),
                work_dir: display_dir(fastlane_dir),
                lanes: parse_lanes(&content),
            });
        }
        debug!(fastfiles = fastfiles.len(), "Fastfiles found");
        self.fastfiles = fastfiles;
        Ok(!self.fastfiles.is_empty())
    }

    fn options(&mut self) -> Result<ScannerOptions> {
        let descriptor = self.descriptor();
        let config = descriptor.config_name();
        let mut root = OptionNode::new(
            "Working directory",
            "The directory containing the fastlane directory",
            WORK_DIR_ENV,
            OptionType::Selector,
        );
        let mut warnings = Vec::new();

        for fastfile in &self.fastfiles {
            if fastfile.lanes.is_empty() {
                warnings.push(format!("No lanes found in {}", fastfile.path));
                continue;
            }
            let mut lanes = OptionNode::new(
                "Fastlane lane",
                "The lane the pipeline runs",
                LANE_ENV,
                OptionType::Selector,
            );
            for lane in &fastfile.lanes {
                lanes.add_config(lane.clone(), config.clone());
            }
            root.add_option(fastfile.work_dir.clone(), lanes);
        }

        if root.values().is_empty() {
            let path = self
                .fastfiles
                .first()
                .map(|f| f.path.clone())
                .unwrap_or_else(|| "Fastfile".to_string());
            anyhow::bail!("No lanes found in {}", path);
        }
        self.descriptors = vec![descriptor];

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
            "Working directory",
            WORK_DIR_ENV,
            user_input(
                "Fastlane lane",
                LANE_ENV,
                OptionNode::leaf(default_config_name(SCANNER_NAME)),
            ),
        )
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        let mut configs = ConfigMap::new();
        configs.insert(
            default_config_name(SCANNER_NAME),
            generate_config(&ConfigDescriptor::new(SCANNER_NAME), RepoAccess::Private)?,
        );
        Ok(configs)
    }
}

impl ToolScanner for FastlaneScanner {
    fn set_detected_platforms(&mut self, detected: &DetectedPlatforms) {
        self.detected = detected.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const FASTFILE: &str = r#"
default_platform(:ios)

lane :test do
  scan
end

platform :ios do
  lane :beta do
    gym
  end

  private_lane :helper do
  end
end

platform :android do
  lane :deploy do
    gradle(task: "bundleRelease")
  end
end
"#;

    fn fastlane_repo(content: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("fastlane")).unwrap();
        fs::write(dir.path().join("fastlane/Fastfile"), content).unwrap();
        dir
    }

    #[test]
    fn test_parse_lanes() {
        assert_eq!(parse_lanes(FASTFILE), vec!["test", "ios beta", "android deploy"]);
    }

    #[test]
    fn test_config_named_after_single_detected_platform() {
        let repo = fastlane_repo(FASTFILE);
        let mut scanner = FastlaneScanner::new();
        scanner.set_detected_platforms(&DetectedPlatforms::new(vec!["ios".to_string()]));
        assert!(scanner.detect_platform(repo.path()).unwrap());
        let options = scanner.options().unwrap();

        let lanes = options.root.child(".").unwrap();
        assert_eq!(lanes.env_key, LANE_ENV);
        assert_eq!(lanes.values().len(), 3);
        assert_eq!(options.root.config_names(), vec!["fastlane-ios-config".to_string()]);

        let configs = scanner.configs(RepoAccess::Public).unwrap();
        let text = configs.get("fastlane-ios-config").unwrap();
        assert!(text.contains("fastlane@3"));
        assert!(text.contains("project_type: ios"));
    }

    #[test]
    fn test_multiple_platforms_use_plain_config() {
        let repo = fastlane_repo(FASTFILE);
        let mut scanner = FastlaneScanner::new();
        scanner.set_detected_platforms(&DetectedPlatforms::new(vec![
            "ios".to_string(),
            "android".to_string(),
        ]));
        scanner.detect_platform(repo.path()).unwrap();
        let options = scanner.options().unwrap();
        assert_eq!(options.root.config_names(), vec!["fastlane-config".to_string()]);
    }

    #[test]
    fn test_fastfile_outside_fastlane_dir_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Fastfile"), FASTFILE).unwrap();
        let mut scanner = FastlaneScanner::new();
        assert!(!scanner.detect_platform(dir.path()).unwrap());
    }

    #[test]
    fn test_no_lanes_fails_options() {
        let repo = fastlane_repo("# nothing here\n");
        let mut scanner = FastlaneScanner::new();
        scanner.detect_platform(repo.path()).unwrap();
        let err = scanner.options().unwrap_err();
        assert_eq!(err.to_string(), "No lanes found in fastlane/Fastfile");
    }
}
