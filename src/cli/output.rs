//! Output formatting for scan results and configuration
//!
//! The result artifact itself is written by [`crate::walker::write_result`];
//! this module renders what the CLI prints to stdout.

use anyhow::{Context, Result};
use std::collections::BTreeMap;

use crate::config::PipeinitConfig;
use crate::models::{Diagnostic, ScanResultModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, result: &ScanResultModel) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(result)
                .context("Failed to serialize scan result to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(result).context("Failed to serialize scan result to YAML")
            }
            OutputFormat::Human => Ok(self.format_human(result)),
        }
    }

    pub fn format_config(&self, config: &PipeinitConfig) -> Result<String> {
        let map: BTreeMap<String, String> = config.to_display_map().into_iter().collect();
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&map).context("Failed to serialize config to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(&map).context("Failed to serialize config to YAML")
            }
            OutputFormat::Human => Ok(config.to_string()),
        }
    }

    fn format_human(&self, result: &ScanResultModel) -> String {
        let mut output = String::new();

        if result.scanner_to_options.is_empty() {
            output.push_str("\u{26A0} Scan Result (no platform detected)\n");
        } else {
            output.push_str("\u{2713} Scan Result\n");
        }
        output.push_str(&"\u{2501}".repeat(42));
        output.push_str("\n\n");

        if !result.scanner_to_options.is_empty() {
            output.push_str("Detected:\n");
            let count = result.scanner_to_options.len();
            for (i, (scanner, tree)) in result.scanner_to_options.iter().enumerate() {
                let connector = if i + 1 == count { "\u{2514}" } else { "\u{251C}" };
                let configs = result
                    .scanner_to_configs
                    .get(scanner)
                    .map(|c| c.names().join(", "))
                    .unwrap_or_default();
                output.push_str(&format!(
                    "{}\u{2500} {:<14} depth {}, configs: {}\n",
                    connector,
                    scanner,
                    tree.depth(),
                    configs
                ));
            }
            output.push('\n');
        }

        push_diagnostics(&mut output, "\u{26A0} Warnings", &result.scanner_to_warnings);
        push_diagnostics(&mut output, "\u{2717} Errors", &result.scanner_to_errors);

        if !result.icons.is_empty() {
            output.push_str(&format!("Icons: {}\n", result.icons.len()));
        }

        output
    }
}

fn push_diagnostics(output: &mut String, heading: &str, by_scanner: &BTreeMap<String, Vec<Diagnostic>>) {
    if by_scanner.values().all(Vec::is_empty) {
        return;
    }
    output.push_str(heading);
    output.push_str(":\n");
    for (scanner, diagnostics) in by_scanner {
        for diagnostic in diagnostics {
            match diagnostic.recommendation().and_then(|r| r.title()) {
                Some(title) => {
                    output.push_str(&format!("  - [{}] {}\n", scanner, title));
                    output.push_str(&format!("      {}\n", diagnostic.message()));
                }
                None => output.push_str(&format!("  - [{}] {}\n", scanner, diagnostic.message())),
            }
        }
    }
    output.push('\n');
}
