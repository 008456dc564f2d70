use super::orchestrator::{DetectionStatus, ScannerOutcome};
use crate::models::ScanResultModel;
use std::collections::BTreeSet;

/// Folds per-scanner outcomes into one result, each scanner in its own
/// namespace.
pub struct ResultAggregator;

impl ResultAggregator {
    pub fn fold(outcomes: impl IntoIterator<Item = ScannerOutcome>) -> ScanResultModel {
        let mut result = ScanResultModel::new();
        let mut seen_icons = BTreeSet::new();

        for outcome in outcomes {
            let name = outcome.name;

            if outcome.status == DetectionStatus::Detected && !outcome.configs.is_empty() {
                if let Some(options) = outcome.options {
                    result.scanner_to_options.insert(name.clone(), options);
                    result.scanner_to_configs.insert(name.clone(), outcome.configs);
                }
            }

            if !outcome.warnings.is_empty() || outcome.status != DetectionStatus::NotDetected {
                result
                    .scanner_to_warnings
                    .entry(name.clone())
                    .or_default()
                    .extend(outcome.warnings);
            }

            if !outcome.errors.is_empty() {
                result
                    .scanner_to_errors
                    .entry(name)
                    .or_default()
                    .extend(outcome.errors);
            }

            for icon in outcome.icons {
                if seen_icons.insert(icon.filename.clone()) {
                    result.icons.push(icon);
                }
            }
        }
        result
    }
}
