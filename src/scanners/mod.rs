//! Platform scanners
//!
//! A scanner detects one technology in the search directory and turns what it
//! found into an option tree plus the pipeline configs the tree's leaves point
//! at. Project scanners detect platforms; tool scanners detect cross-cutting
//! automation whose output depends on which platforms were detected.
//!
//! Scanners are stateful for the duration of a single scan: `detect_platform`
//! records findings that `options` and `configs` build on.

use crate::models::{ConfigMap, Icon, OptionNode};
use crate::workflow::RepoAccess;
use anyhow::Result;
use std::path::Path;

pub mod android;
pub mod cordova;
pub mod fastlane;
pub mod files;
pub mod flutter;
pub mod ionic;
pub mod node;
pub mod react_native;
pub mod xamarin;
pub mod xcode;

pub use android::AndroidScanner;
pub use cordova::CordovaScanner;
pub use fastlane::FastlaneScanner;
pub use flutter::FlutterScanner;
pub use ionic::IonicScanner;
pub use react_native::ReactNativeScanner;
pub use xamarin::XamarinScanner;
pub use xcode::{XcodeProjectType, XcodeScanner};

/// What a scanner's `options` call produces besides failing.
#[derive(Debug, Clone)]
pub struct ScannerOptions {
    pub root: OptionNode,
    pub warnings: Vec<String>,
    pub icons: Vec<Icon>,
}

impl ScannerOptions {
    pub fn new(root: OptionNode) -> Self {
        Self {
            root,
            warnings: Vec::new(),
            icons: Vec::new(),
        }
    }
}

pub trait Scanner {
    fn name(&self) -> &'static str;

    /// Looks for the platform's markers under `search_dir`.
    fn detect_platform(&mut self, search_dir: &Path) -> Result<bool>;

    /// Builds the option tree for what `detect_platform` found.
    fn options(&mut self) -> Result<ScannerOptions>;

    /// Generates one pipeline per distinct config name in the option tree.
    fn configs(&self, repo_access: RepoAccess) -> Result<ConfigMap>;

    /// Tree used in manual mode, when nothing was detected.
    fn default_options(&self) -> OptionNode;

    fn default_configs(&self) -> Result<ConfigMap>;

    /// Scanners that must not run once this one detected its platform.
    fn excluded_scanner_names(&self) -> Vec<&'static str> {
        Vec::new()
    }
}

/// Names of project scanners that detected their platform in pass one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedPlatforms(Vec<String>);

impl DetectedPlatforms {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub trait ToolScanner: Scanner {
    fn set_detected_platforms(&mut self, detected: &DetectedPlatforms);
}

/// Ordered scanner lists for one scan.
pub struct ScannerRegistry {
    project_scanners: Vec<Box<dyn Scanner>>,
    tool_scanners: Vec<Box<dyn ToolScanner>>,
}

impl ScannerRegistry {
    pub fn new() -> Self {
        Self {
            project_scanners: Vec::new(),
            tool_scanners: Vec::new(),
        }
    }

    /// Built-in scanners in their run order. Scanners whose projects embed
    /// other platforms' projects come first so their exclusions apply.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_project(Box::new(ReactNativeScanner::new()));
        registry.register_project(Box::new(FlutterScanner::new()));
        registry.register_project(Box::new(IonicScanner::new()));
        registry.register_project(Box::new(CordovaScanner::new()));
        registry.register_project(Box::new(XcodeScanner::new(XcodeProjectType::Ios)));
        registry.register_project(Box::new(XcodeScanner::new(XcodeProjectType::MacOs)));
        registry.register_project(Box::new(AndroidScanner::new()));
        registry.register_project(Box::new(XamarinScanner::new()));
        registry.register_tool(Box::new(FastlaneScanner::new()));
        registry
    }

    pub fn register_project(&mut self, scanner: Box<dyn Scanner>) {
        self.project_scanners.push(scanner);
    }

    pub fn register_tool(&mut self, scanner: Box<dyn ToolScanner>) {
        self.tool_scanners.push(scanner);
    }

    pub fn project_scanners_mut(&mut self) -> &mut [Box<dyn Scanner>] {
        &mut self.project_scanners
    }

    pub fn tool_scanners_mut(&mut self) -> &mut [Box<dyn ToolScanner>] {
        &mut self.tool_scanners
    }

    pub fn project_scanners(&self) -> &[Box<dyn Scanner>] {
        &self.project_scanners
    }

    pub fn tool_scanners(&self) -> &[Box<dyn ToolScanner>] {
        &self.tool_scanners
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.project_scanners
            .iter()
            .map(|s| s.name())
            .chain(self.tool_scanners.iter().map(|s| s.name()))
            .collect()
    }
}

impl Default for ScannerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// User-input question whose single `_` child is `child`.
pub(crate) fn user_input(title: &str, env_key: &str, child: OptionNode) -> OptionNode {
    let mut node = OptionNode::new(title, "", env_key, crate::models::OptionType::UserInput);
    node.add_option(crate::models::USER_INPUT_VALUE, child);
    node
}
