//! Aggregate output of one scan.

use super::{ConfigMap, Diagnostic, Icon, OptionNode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scanner name used for failures that belong to no scanner.
pub const GENERAL_KEY: &str = "general";

/// Every scanner's contribution, each kept under its own name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanResultModel {
    #[serde(rename = "options", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scanner_to_options: BTreeMap<String, OptionNode>,

    #[serde(rename = "configs", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scanner_to_configs: BTreeMap<String, ConfigMap>,

    #[serde(rename = "warnings", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scanner_to_warnings: BTreeMap<String, Vec<Diagnostic>>,

    #[serde(rename = "errors", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scanner_to_errors: BTreeMap<String, Vec<Diagnostic>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<Icon>,
}

impl ScanResultModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result carrying a single `general` error and nothing else.
    pub fn with_general_error(message: impl Into<String>) -> Self {
        let mut result = Self::new();
        result.add_general_error(Diagnostic::plain(message));
        result
    }

    pub fn add_general_error(&mut self, error: Diagnostic) {
        self.add_error(GENERAL_KEY, error);
    }

    pub fn add_error(&mut self, scanner: &str, error: Diagnostic) {
        self.scanner_to_errors
            .entry(scanner.to_string())
            .or_default()
            .push(error);
    }

    /// Scanners that contributed an option tree, sorted.
    pub fn detected_scanner_names(&self) -> Vec<String> {
        self.scanner_to_options.keys().cloned().collect()
    }

    pub fn has_errors(&self) -> bool {
        self.scanner_to_errors.values().any(|errors| !errors.is_empty())
    }

    pub fn general_errors(&self) -> &[Diagnostic] {
        self.scanner_to_errors
            .get(GENERAL_KEY)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn config_text(&self, scanner: &str, config: &str) -> Option<&str> {
        self.scanner_to_configs.get(scanner)?.get(config)
    }
}
