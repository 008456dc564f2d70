use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::walker::ArtifactFormat;

/// Scans a repository and proposes CI pipeline configurations
#[derive(Parser, Debug)]
#[command(
    name = "pipeinit",
    about = "Scans a repository and proposes CI pipeline configurations",
    version,
    author,
    long_about = "pipeinit detects which mobile and web project types a repository contains \
                  (Android, iOS, macOS, Xamarin, React Native, Flutter, Cordova, Ionic, \
                  fastlane) and generates candidate pipeline definitions together with the \
                  decision tree that selects between them."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Scan a repository for known project types",
        long_about = "Runs every scanner against the repository. In CI mode the full result \
                      (options, configs, warnings, errors, icons) is written as result.yml or \
                      result.json; otherwise the option tree is walked interactively and the \
                      chosen pipeline is written as bitrise.yml.\n\n\
                      Examples:\n  \
                      pipeinit scan --ci\n  \
                      pipeinit scan /path/to/repo --ci --format json\n  \
                      pipeinit scan --private --output-dir out"
    )]
    Scan(ScanArgs),

    #[command(
        about = "Emit default configurations without scanning",
        long_about = "Produces every scanner's default option tree and configs, for projects \
                      the scanners cannot detect.\n\n\
                      Examples:\n  \
                      pipeinit manual --ci\n  \
                      pipeinit manual --ci --format json"
    )]
    Manual(ManualArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    #[arg(
        value_name = "DIR",
        help = "Directory to scan (defaults to current directory)"
    )]
    pub dir: Option<PathBuf>,

    #[arg(long, help = "Write the whole result instead of prompting")]
    pub ci: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        help = "Result artifact format (overrides PIPEINIT_OUTPUT_FORMAT)"
    )]
    pub format: Option<OutputFormatArg>,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Output directory (overrides PIPEINIT_OUTPUT_DIR)"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Generate pipelines for a private repository")]
    pub private: bool,

    #[arg(long, value_name = "URL", help = "API base URL for icon upload")]
    pub api_url: Option<String>,

    #[arg(long, value_name = "SLUG", help = "App slug for icon upload")]
    pub app_slug: Option<String>,

    #[arg(long, value_name = "TOKEN", help = "API token for icon upload")]
    pub api_token: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ManualArgs {
    #[arg(long, help = "Write the whole result instead of prompting")]
    pub ci: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        help = "Result artifact format (overrides PIPEINIT_OUTPUT_FORMAT)"
    )]
    pub format: Option<OutputFormatArg>,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Output directory (overrides PIPEINIT_OUTPUT_DIR)"
    )]
    pub output_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
}

impl From<OutputFormatArg> for ArtifactFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => ArtifactFormat::Json,
            OutputFormatArg::Yaml => ArtifactFormat::Yaml,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_default_scan_args() {
        let args = CliArgs::parse_from(["pipeinit", "scan"]);
        match args.command {
            Commands::Scan(scan_args) => {
                assert!(scan_args.dir.is_none());
                assert!(!scan_args.ci);
                assert!(scan_args.format.is_none());
                assert!(scan_args.output_dir.is_none());
                assert!(!scan_args.private);
                assert!(scan_args.api_url.is_none());
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_scan_with_options() {
        let args = CliArgs::parse_from([
            "pipeinit",
            "scan",
            "/tmp/repo",
            "--ci",
            "--format",
            "json",
            "--output-dir",
            "out",
            "--private",
            "--api-url",
            "https://api.example.com",
            "--app-slug",
            "abc",
            "--api-token",
            "secret",
        ]);

        match args.command {
            Commands::Scan(scan_args) => {
                assert_eq!(scan_args.dir, Some(PathBuf::from("/tmp/repo")));
                assert!(scan_args.ci);
                assert_eq!(scan_args.format, Some(OutputFormatArg::Json));
                assert_eq!(scan_args.output_dir, Some(PathBuf::from("out")));
                assert!(scan_args.private);
                assert_eq!(scan_args.app_slug.as_deref(), Some("abc"));
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_manual_command() {
        let args = CliArgs::parse_from(["pipeinit", "manual", "--ci", "-f", "yaml"]);
        match args.command {
            Commands::Manual(manual_args) => {
                assert!(manual_args.ci);
                assert_eq!(manual_args.format, Some(OutputFormatArg::Yaml));
            }
            _ => panic!("Expected Manual command"),
        }
    }

    #[test]
    fn test_invalid_format_rejected() {
        assert!(CliArgs::try_parse_from(["pipeinit", "scan", "--format", "toml"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let args = CliArgs::parse_from(["pipeinit", "-v", "scan"]);
        assert!(args.verbose);
        assert!(!args.quiet);

        let args = CliArgs::parse_from(["pipeinit", "scan", "-q"]);
        assert!(args.quiet);

        let args = CliArgs::parse_from(["pipeinit", "--log-level", "debug", "manual"]);
        assert_eq!(args.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(CliArgs::try_parse_from(["pipeinit", "-v", "-q", "scan"]).is_err());
    }

    #[test]
    fn test_format_arg_conversion() {
        assert_eq!(ArtifactFormat::from(OutputFormatArg::Json), ArtifactFormat::Json);
        assert_eq!(ArtifactFormat::from(OutputFormatArg::Yaml), ArtifactFormat::Yaml);
    }
}
