//! pipeinit - repository scanner that proposes CI pipeline configurations
//!
//! A scan runs a fixed set of platform scanners (Android, Xcode, Xamarin,
//! React Native, Flutter, Cordova, Ionic, fastlane) against a directory. Each
//! scanner that recognizes its platform contributes an option tree, the
//! pipeline configs its leaves name, and any warnings or errors it ran into.
//!
//! # Core Concepts
//!
//! - **Option tree**: questions (project path, scheme, export method, ...)
//!   whose answers lead to exactly one config name
//! - **Config**: a complete pipeline definition rendered as YAML text,
//!   shared by every leaf that needs the same feature set
//! - **Two passes**: project scanners run first; tool scanners (fastlane)
//!   run second and know which platforms were found
//!
//! # Example Usage
//!
//! ```no_run
//! use pipeinit::scan::ScanOrchestrator;
//! use pipeinit::scanners::ScannerRegistry;
//! use pipeinit::walker::{render, ArtifactFormat};
//! use pipeinit::workflow::RepoAccess;
//! use std::path::Path;
//!
//! let mut orchestrator = ScanOrchestrator::new(ScannerRegistry::with_defaults(), RepoAccess::Public);
//! let result = orchestrator.run(Path::new("."));
//! println!("{}", render(&result, ArtifactFormat::Yaml).unwrap());
//! ```

pub mod cli;
pub mod config;
pub mod icons;
pub mod models;
pub mod recommendation;
pub mod scan;
pub mod scanners;
pub mod util;
pub mod walker;
pub mod workflow;

pub use config::{ConfigError, PipeinitConfig, UploadCredentials};
pub use models::{ConfigMap, Diagnostic, Icon, OptionNode, OptionType, ScanResultModel};
pub use scan::{default_result, ScanError, ScanOrchestrator};
pub use scanners::{Scanner, ScannerRegistry, ToolScanner};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
