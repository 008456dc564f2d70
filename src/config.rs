//! Configuration management for pipeinit
//!
//! Settings are loaded from environment variables with defaults; command-line
//! flags override them in the CLI handlers.
//!
//! # Environment Variables
//!
//! - `PIPEINIT_OUTPUT_DIR`: Directory for scan artifacts - default: "_scan_result"
//! - `PIPEINIT_OUTPUT_FORMAT`: Result artifact format (yaml|json) - default: "yaml"
//! - `PIPEINIT_PRIVATE_REPOSITORY`: Generate pipelines for a private repository (true|false) - default: "false"
//! - `PIPEINIT_LOG_LEVEL`: Logging level - default: "info"
//!
//! ## Icon upload
//! Icons are uploaded only when all three are set:
//! - `PIPEINIT_API_URL`
//! - `PIPEINIT_APP_SLUG`
//! - `PIPEINIT_API_TOKEN`
//!
//! # Example
//!
//! ```no_run
//! use pipeinit::PipeinitConfig;
//!
//! let config = PipeinitConfig::default();
//! config.validate().expect("Invalid configuration");
//! ```

use crate::walker::ArtifactFormat;
use crate::workflow::RepoAccess;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_OUTPUT_DIR: &str = "_scan_result";
const DEFAULT_OUTPUT_FORMAT: &str = "yaml";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Credentials for the avatar-candidates API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCredentials {
    pub api_url: String,
    pub app_slug: String,
    pub api_token: String,
}

#[derive(Debug, Clone)]
pub struct PipeinitConfig {
    /// Where `result.yml`/`result.json` or `bitrise.yml` is written
    pub output_dir: PathBuf,

    /// Result artifact format as given (yaml, yml or json)
    pub output_format: String,

    pub private_repository: bool,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    pub api_url: Option<String>,
    pub app_slug: Option<String>,
    pub api_token: Option<String>,
}

impl Default for PipeinitConfig {
    /// Reads PIPEINIT_* environment variables, falling back to defaults.
    fn default() -> Self {
        let output_dir = env::var("PIPEINIT_OUTPUT_DIR")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let output_format = env::var("PIPEINIT_OUTPUT_FORMAT")
            .unwrap_or_else(|_| DEFAULT_OUTPUT_FORMAT.to_string())
            .to_lowercase();

        let private_repository = env::var("PIPEINIT_PRIVATE_REPOSITORY")
            .ok()
            .and_then(|v| v.to_lowercase().parse::<bool>().ok())
            .unwrap_or(false);

        let log_level = env::var("PIPEINIT_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            output_dir,
            output_format,
            private_repository,
            log_level,
            api_url: non_empty_var("PIPEINIT_API_URL"),
            app_slug: non_empty_var("PIPEINIT_APP_SLUG"),
            api_token: non_empty_var("PIPEINIT_API_TOKEN"),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl PipeinitConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an unknown output format or log level, or an
    /// API URL that is not http(s).
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.artifact_format()?;

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Output directory must not be empty".to_string(),
            ));
        }

        if let Some(url) = &self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::ValidationFailed(format!(
                    "API URL must start with http:// or https://, got: {}",
                    url
                )));
            }
        }

        Ok(())
    }

    pub fn artifact_format(&self) -> Result<ArtifactFormat, ConfigError> {
        self.output_format
            .parse()
            .map_err(|error| ConfigError::ParseError {
                field: "PIPEINIT_OUTPUT_FORMAT".to_string(),
                error,
            })
    }

    pub fn repo_access(&self) -> RepoAccess {
        RepoAccess::from_private_flag(self.private_repository)
    }

    /// All three upload settings, or `None` if any is missing.
    pub fn upload_credentials(&self) -> Option<UploadCredentials> {
        Some(UploadCredentials {
            api_url: self.api_url.clone()?,
            app_slug: self.app_slug.clone()?,
            api_token: self.api_token.clone()?,
        })
    }

    /// Converts configuration to a display map for output formatting.
    /// The API token is masked.
    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert(
            "output_dir".to_string(),
            self.output_dir.display().to_string(),
        );
        map.insert("output_format".to_string(), self.output_format.clone());
        map.insert(
            "private_repository".to_string(),
            self.private_repository.to_string(),
        );
        map.insert("log_level".to_string(), self.log_level.clone());
        if let Some(ref url) = self.api_url {
            map.insert("api_url".to_string(), url.clone());
        }
        if let Some(ref slug) = self.app_slug {
            map.insert("app_slug".to_string(), slug.clone());
        }
        if self.api_token.is_some() {
            map.insert("api_token".to_string(), "********".to_string());
        }

        map
    }
}

impl fmt::Display for PipeinitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeinit Configuration:")?;
        writeln!(f, "  Output Dir: {}", self.output_dir.display())?;
        writeln!(f, "  Output Format: {}", self.output_format)?;
        writeln!(f, "  Private Repository: {}", self.private_repository)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(
            f,
            "  Icon Upload: {}",
            if self.upload_credentials().is_some() {
                "enabled"
            } else {
                "disabled"
            }
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn sample() -> PipeinitConfig {
        PipeinitConfig {
            output_dir: PathBuf::from("_scan_result"),
            output_format: "yaml".to_string(),
            private_repository: false,
            log_level: "info".to_string(),
            api_url: None,
            app_slug: None,
            api_token: None,
        }
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = vec![
            EnvGuard::unset("PIPEINIT_OUTPUT_DIR"),
            EnvGuard::unset("PIPEINIT_OUTPUT_FORMAT"),
            EnvGuard::unset("PIPEINIT_PRIVATE_REPOSITORY"),
            EnvGuard::unset("PIPEINIT_LOG_LEVEL"),
            EnvGuard::unset("PIPEINIT_API_URL"),
        ];

        let config = PipeinitConfig::default();

        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.artifact_format().unwrap(), ArtifactFormat::Yaml);
        assert!(!config.private_repository);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(config.upload_credentials().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = vec![
            EnvGuard::set("PIPEINIT_OUTPUT_DIR", "/tmp/out"),
            EnvGuard::set("PIPEINIT_OUTPUT_FORMAT", "JSON"),
            EnvGuard::set("PIPEINIT_PRIVATE_REPOSITORY", "true"),
            EnvGuard::set("PIPEINIT_LOG_LEVEL", "DEBUG"),
            EnvGuard::set("PIPEINIT_API_URL", "https://api.example.com"),
            EnvGuard::set("PIPEINIT_APP_SLUG", "abc123"),
            EnvGuard::set("PIPEINIT_API_TOKEN", "secret"),
        ];

        let config = PipeinitConfig::default();

        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.artifact_format().unwrap(), ArtifactFormat::Json);
        assert!(config.private_repository);
        assert_eq!(config.repo_access(), RepoAccess::Private);
        assert_eq!(config.log_level, "debug");
        assert_eq!(
            config.upload_credentials(),
            Some(UploadCredentials {
                api_url: "https://api.example.com".to_string(),
                app_slug: "abc123".to_string(),
                api_token: "secret".to_string(),
            })
        );
    }

    #[test]
    fn test_partial_credentials_disable_upload() {
        let mut config = sample();
        config.api_url = Some("https://api.example.com".to_string());
        config.app_slug = Some("abc".to_string());
        assert!(config.upload_credentials().is_none());
    }

    #[test]
    fn test_configuration_validation_invalid_format() {
        let mut config = sample();
        config.output_format = "toml".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_configuration_validation_invalid_log_level() {
        let mut config = sample();
        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configuration_validation_invalid_api_url() {
        let mut config = sample();
        config.api_url = Some("api.example.com".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_display_map_masks_token() {
        let mut config = sample();
        config.api_token = Some("secret".to_string());
        let map = config.to_display_map();
        assert_eq!(map.get("api_token").map(String::as_str), Some("********"));
        assert_eq!(map.get("output_format").map(String::as_str), Some("yaml"));
    }

    #[test]
    fn test_config_display() {
        let display = format!("{}", sample());
        assert!(display.contains("Pipeinit Configuration:"));
        assert!(display.contains("Icon Upload: disabled"));
    }
}
