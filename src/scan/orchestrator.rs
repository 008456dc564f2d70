//! Two-pass scanner run.
//!
//! Pass one runs the project scanners in registration order. The names of
//! the scanners that fully succeeded are handed to the tool scanners, which
//! run in pass two. A scanner that detected its platform can exclude other
//! scanners from both passes; excluded scanners are never asked to detect.

use super::aggregator::ResultAggregator;
use super::workdir::WorkdirGuard;
use super::ScanError;
use crate::models::{ConfigMap, Diagnostic, Icon, OptionNode, ScanResultModel};
use crate::recommendation::{classify, Tag};
use crate::scanners::{DetectedPlatforms, Scanner, ScannerRegistry};
use crate::workflow::RepoAccess;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// Scanner names that must be skipped for the rest of the scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludedScanners(BTreeSet<String>);

impl ExcludedScanners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn extend<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        self.0.extend(names.into_iter().map(str::to_string));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionStatus {
    NotDetected,
    DetectedWithErrors,
    Detected,
}

/// Everything one scanner reported during a pass.
#[derive(Debug, Clone)]
pub struct ScannerOutcome {
    pub name: String,
    pub status: DetectionStatus,
    pub options: Option<OptionNode>,
    pub configs: ConfigMap,
    pub warnings: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
    pub icons: Vec<Icon>,
}

impl ScannerOutcome {
    pub fn new(name: impl Into<String>, status: DetectionStatus) -> Self {
        Self {
            name: name.into(),
            status,
            options: None,
            configs: ConfigMap::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            icons: Vec::new(),
        }
    }
}

pub struct ScanOrchestrator {
    registry: ScannerRegistry,
    repo_access: RepoAccess,
}

impl ScanOrchestrator {
    pub fn new(registry: ScannerRegistry, repo_access: RepoAccess) -> Self {
        Self {
            registry,
            repo_access,
        }
    }

    /// Scans `search_dir`. Never fails: setup problems become a single
    /// `general` error in the returned result.
    pub fn run(&mut self, search_dir: &Path) -> ScanResultModel {
        match self.try_run(search_dir) {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "Scan setup failed");
                ScanResultModel::with_general_error(err.to_string())
            }
        }
    }

    fn try_run(&mut self, search_dir: &Path) -> Result<ScanResultModel, ScanError> {
        let search_dir = search_dir
            .canonicalize()
            .map_err(|source| ScanError::InvalidSearchDir {
                path: search_dir.to_path_buf(),
                source,
            })?;
        let _workdir = WorkdirGuard::enter(&search_dir)?;
        info!("Scanning {}", search_dir.display());

        let mut excluded = ExcludedScanners::new();

        info!("Running project scanners");
        let project_outcomes = run_pass(
            self.registry.project_scanners_mut(),
            &search_dir,
            self.repo_access,
            &mut excluded,
        );

        let detected = DetectedPlatforms::new(
            project_outcomes
                .iter()
                .filter(|o| o.status == DetectionStatus::Detected)
                .map(|o| o.name.clone())
                .collect(),
        );
        debug!(platforms = ?detected.names(), "Detected platforms");

        info!("Running tool scanners");
        for tool in self.registry.tool_scanners_mut() {
            tool.set_detected_platforms(&detected);
        }
        let tool_outcomes = run_pass(
            self.registry.tool_scanners_mut(),
            &search_dir,
            self.repo_access,
            &mut excluded,
        );

        Ok(ResultAggregator::fold(merge(project_outcomes, tool_outcomes)))
    }
}

/// Keyed by scanner name; an outcome from the second pass replaces one from
/// the first.
pub fn merge(first: Vec<ScannerOutcome>, second: Vec<ScannerOutcome>) -> Vec<ScannerOutcome> {
    let mut merged: BTreeMap<String, ScannerOutcome> = BTreeMap::new();
    for outcome in first.into_iter().chain(second) {
        merged.insert(outcome.name.clone(), outcome);
    }
    merged.into_values().collect()
}

/// Runs one pass. Excluded scanners produce no outcome at all.
pub fn run_pass<S: Scanner + ?Sized>(
    scanners: &mut [Box<S>],
    search_dir: &Path,
    repo_access: RepoAccess,
    excluded: &mut ExcludedScanners,
) -> Vec<ScannerOutcome> {
    let mut outcomes = Vec::with_capacity(scanners.len());
    for scanner in scanners.iter_mut() {
        let name = scanner.name();
        if excluded.contains(name) {
            debug!(scanner = name, "Skipping excluded scanner");
            continue;
        }
        let outcome = run_scanner(scanner.as_mut(), search_dir, repo_access, excluded);
        debug!(scanner = name, status = ?outcome.status, "Scanner finished");
        outcomes.push(outcome);
    }
    outcomes
}

fn run_scanner<S: Scanner + ?Sized>(
    scanner: &mut S,
    search_dir: &Path,
    repo_access: RepoAccess,
    excluded: &mut ExcludedScanners,
) -> ScannerOutcome {
    let name = scanner.name();

    match scanner.detect_platform(search_dir) {
        Ok(true) => {}
        Ok(false) => return ScannerOutcome::new(name, DetectionStatus::NotDetected),
        Err(err) => {
            let raw = format!("{:#}", err);
            warn!(scanner = name, error = %raw, "Platform detection failed");
            let mut outcome = ScannerOutcome::new(name, DetectionStatus::NotDetected);
            outcome.warnings.push(Diagnostic::with_recommendation(
                raw.clone(),
                classify(Tag::DetectPlatformFailed, &raw),
            ));
            return outcome;
        }
    }

    info!(scanner = name, "Platform detected");
    excluded.extend(scanner.excluded_scanner_names());

    let options = match scanner.options() {
        Ok(options) => options,
        Err(err) => {
            let raw = format!("{:#}", err);
            warn!(scanner = name, error = %raw, "Failed to collect options");
            let mut outcome = ScannerOutcome::new(name, DetectionStatus::DetectedWithErrors);
            outcome.warnings.push(Diagnostic::with_recommendation(
                raw.clone(),
                classify(Tag::OptionsFailed, &raw),
            ));
            return outcome;
        }
    };

    let mut outcome = ScannerOutcome::new(name, DetectionStatus::DetectedWithErrors);
    outcome.warnings = options.warnings.into_iter().map(Diagnostic::plain).collect();
    outcome.icons = options.icons;

    match scanner.configs(repo_access) {
        Ok(configs) => {
            outcome.status = DetectionStatus::Detected;
            outcome.options = Some(options.root);
            outcome.configs = configs;
        }
        Err(err) => {
            let raw = format!("{:#}", err);
            warn!(scanner = name, error = %raw, "Failed to generate configs");
            outcome.errors.push(Diagnostic::plain(raw));
        }
    }
    outcome
}
