//! Command handlers. Each returns the process exit code.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::commands::{ManualArgs, ScanArgs};
use super::output::{OutputFormat, OutputFormatter};
use crate::config::PipeinitConfig;
use crate::icons::IconUploader;
use crate::models::{Diagnostic, ScanResultModel};
use crate::scan::{default_result, ScanOrchestrator};
use crate::scanners::ScannerRegistry;
use crate::walker::{write_result, ArtifactFormat, OptionWalker, Prompter, TerminalPrompter};

/// File name of the pipeline written in interactive mode.
pub const PIPELINE_FILE_NAME: &str = "bitrise.yml";

pub fn handle_scan(args: &ScanArgs, quiet: bool) -> i32 {
    match run_scan(args, quiet) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

pub fn handle_manual(args: &ManualArgs, quiet: bool) -> i32 {
    match run_manual(args, quiet) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

/// Environment config with the scan flags applied on top.
pub fn scan_config(args: &ScanArgs) -> PipeinitConfig {
    let mut config = PipeinitConfig::default();
    if let Some(format) = args.format {
        config.output_format = ArtifactFormat::from(format).name().to_string();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if args.private {
        config.private_repository = true;
    }
    if args.api_url.is_some() {
        config.api_url = args.api_url.clone();
    }
    if args.app_slug.is_some() {
        config.app_slug = args.app_slug.clone();
    }
    if args.api_token.is_some() {
        config.api_token = args.api_token.clone();
    }
    config
}

pub fn manual_config(args: &ManualArgs) -> PipeinitConfig {
    let mut config = PipeinitConfig::default();
    if let Some(format) = args.format {
        config.output_format = ArtifactFormat::from(format).name().to_string();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    config
}

fn run_scan(args: &ScanArgs, quiet: bool) -> Result<i32> {
    let config = scan_config(args);
    config.validate().context("Invalid configuration")?;
    let format = config.artifact_format()?;

    // A missing directory comes back as a general error in the result.
    let search_dir = args.dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut orchestrator =
        ScanOrchestrator::new(ScannerRegistry::with_defaults(), config.repo_access());
    let mut result = orchestrator.run(&search_dir);

    let detected = result.ensure_detected();
    if let Err(err) = &detected {
        // A setup failure already left its own general error.
        if result.general_errors().is_empty() {
            result.add_general_error(Diagnostic::plain(err.to_string()));
        }
    }

    upload_icons(&config, &result);

    if args.ci {
        let path = write_result(&result, format, &config.output_dir)?;
        report(&result, &path, quiet)?;
    } else if detected.is_ok() {
        let path = write_pipeline(&result, TerminalPrompter, &config.output_dir)?;
        if !quiet {
            println!("Pipeline written to {}", path.display());
        }
    } else if !quiet {
        print!("{}", OutputFormatter::new(OutputFormat::Human).format(&result)?);
    }

    Ok(if detected.is_ok() { 0 } else { 1 })
}

fn run_manual(args: &ManualArgs, quiet: bool) -> Result<i32> {
    let config = manual_config(args);
    config.validate().context("Invalid configuration")?;
    let format = config.artifact_format()?;

    let result = default_result(&ScannerRegistry::with_defaults());

    if args.ci {
        let path = write_result(&result, format, &config.output_dir)?;
        report(&result, &path, quiet)?;
    } else {
        let path = write_pipeline(&result, TerminalPrompter, &config.output_dir)?;
        if !quiet {
            println!("Pipeline written to {}", path.display());
        }
    }

    Ok(if result.has_errors() { 1 } else { 0 })
}

fn report(result: &ScanResultModel, path: &Path, quiet: bool) -> Result<()> {
    if quiet {
        return Ok(());
    }
    print!("{}", OutputFormatter::new(OutputFormat::Human).format(result)?);
    println!("Result written to {}", path.display());
    Ok(())
}

/// Walks `result` with `prompter` and writes the chosen pipeline, with the
/// answers appended to its app envs, as `bitrise.yml` in `output_dir`.
pub fn write_pipeline<P: Prompter>(
    result: &ScanResultModel,
    prompter: P,
    output_dir: &Path,
) -> Result<PathBuf> {
    let mut walker = OptionWalker::new(result, prompter);
    let resolution = walker.walk()?;
    let config_text = result
        .config_text(&resolution.scanner, &resolution.config_name)
        .with_context(|| {
            format!(
                "Config {} missing for scanner {}",
                resolution.config_name, resolution.scanner
            )
        })?;
    let pipeline = resolution.render_pipeline(config_text)?;

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
    let path = output_dir.join(PIPELINE_FILE_NAME);
    fs::write(&path, pipeline).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(
        scanner = %resolution.scanner,
        config = %resolution.config_name,
        path = %path.display(),
        "Pipeline written"
    );
    Ok(path)
}

/// Upload failures never fail the scan.
fn upload_icons(config: &PipeinitConfig, result: &ScanResultModel) {
    let Some(credentials) = config.upload_credentials() else {
        return;
    };
    if result.icons.is_empty() {
        return;
    }
    let uploaded = IconUploader::new(
        &credentials.api_url,
        &credentials.app_slug,
        &credentials.api_token,
    )
    .and_then(|uploader| uploader.upload(&result.icons));
    match uploaded {
        Ok(count) => info!(count, "Icons uploaded"),
        Err(err) => warn!(error = %err, "Icon upload failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{CliArgs, Commands};
    use crate::walker::ScriptedPrompter;
    use clap::Parser;
    use serial_test::serial;
    use tempfile::TempDir;

    fn parse_scan(argv: &[&str]) -> ScanArgs {
        match CliArgs::parse_from(argv).command {
            Commands::Scan(args) => args,
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    #[serial]
    fn test_flags_override_env() {
        std::env::set_var("PIPEINIT_OUTPUT_FORMAT", "yaml");
        std::env::set_var("PIPEINIT_OUTPUT_DIR", "from-env");
        let args = parse_scan(&["pipeinit", "scan", "--format", "json", "--private"]);
        let config = scan_config(&args);
        std::env::remove_var("PIPEINIT_OUTPUT_FORMAT");
        std::env::remove_var("PIPEINIT_OUTPUT_DIR");

        assert_eq!(config.output_format, "json");
        assert_eq!(config.output_dir, PathBuf::from("from-env"));
        assert!(config.private_repository);
    }

    #[test]
    fn test_write_pipeline_from_defaults() {
        let out = TempDir::new().unwrap();
        let result = default_result(&ScannerRegistry::with_defaults());
        let prompter = ScriptedPrompter::new(["android", "app", "assembleRelease"]);

        let path = write_pipeline(&result, prompter, out.path()).unwrap();
        assert_eq!(path, out.path().join(PIPELINE_FILE_NAME));

        let doc: serde_yaml::Value =
            serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert!(doc["workflows"].as_mapping().is_some());
        let envs = doc["app"]["envs"].as_sequence().unwrap();
        let last = envs.last().unwrap();
        assert_eq!(last["GRADLE_TASK"].as_str(), Some("assembleRelease"));
    }

    #[test]
    #[serial]
    fn test_scan_missing_dir_writes_general_error() {
        let out = TempDir::new().unwrap();
        let output_dir = out.path().to_str().unwrap();
        let args = parse_scan(&[
            "pipeinit",
            "scan",
            "/definitely/not/here",
            "--ci",
            "--output-dir",
            output_dir,
        ]);
        assert_eq!(handle_scan(&args, true), 1);

        let text = fs::read_to_string(out.path().join("result.yml")).unwrap();
        let result: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
        let general = result["errors"]["general"].as_sequence().unwrap();
        assert_eq!(general.len(), 1);
        assert!(general[0].as_str().unwrap().contains("/definitely/not/here"));
    }
}
