//! CI mode: the whole result, serialized as-is for machine consumers.

use crate::models::ScanResultModel;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtifactFormat {
    #[default]
    Yaml,
    Json,
}

impl ArtifactFormat {
    pub fn name(&self) -> &'static str {
        match self {
            ArtifactFormat::Yaml => "yaml",
            ArtifactFormat::Json => "json",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactFormat::Yaml => "result.yml",
            ArtifactFormat::Json => "result.json",
        }
    }
}

impl FromStr for ArtifactFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(ArtifactFormat::Yaml),
            "json" => Ok(ArtifactFormat::Json),
            other => Err(format!("Invalid output format '{}'. Valid formats: yaml, json", other)),
        }
    }
}

pub fn render(result: &ScanResultModel, format: ArtifactFormat) -> Result<String> {
    match format {
        ArtifactFormat::Yaml => {
            serde_yaml::to_string(result).context("Failed to serialize scan result to YAML")
        }
        ArtifactFormat::Json => {
            serde_json::to_string_pretty(result).context("Failed to serialize scan result to JSON")
        }
    }
}

/// Writes `result.yml` or `result.json` into `output_dir`, creating it.
pub fn write_result(
    result: &ScanResultModel,
    format: ArtifactFormat,
    output_dir: &Path,
) -> Result<PathBuf> {
    let content = render(result, format)?;
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
    let path = output_dir.join(format.file_name());
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Scan result written");
    Ok(path)
}
