//! Manual mode: every scanner's default tree and configs, no detection.

use crate::models::{Diagnostic, ScanResultModel};
use crate::scanners::{Scanner, ScannerRegistry};
use tracing::{debug, warn};

pub fn default_result(registry: &ScannerRegistry) -> ScanResultModel {
    let mut result = ScanResultModel::new();
    add_defaults(&mut result, registry.project_scanners());
    add_defaults(&mut result, registry.tool_scanners());
    result
}

fn add_defaults<S: Scanner + ?Sized>(result: &mut ScanResultModel, scanners: &[Box<S>]) {
    for scanner in scanners {
        let name = scanner.name().to_string();
        match scanner.default_configs() {
            Ok(configs) => {
                debug!(scanner = %name, configs = configs.len(), "Default configs generated");
                result
                    .scanner_to_options
                    .insert(name.clone(), scanner.default_options());
                result.scanner_to_configs.insert(name, configs);
            }
            Err(err) => {
                let raw = format!("{:#}", err);
                warn!(scanner = %name, error = %raw, "Failed to generate default configs");
                result.add_error(&name, Diagnostic::plain(raw));
            }
        }
    }
}
