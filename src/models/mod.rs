//! Data model shared by scanners, the orchestrator and the walkers.

pub mod config;
pub mod diagnostic;
pub mod icon;
pub mod option;
pub mod result;

pub use config::{default_config_name, ConfigCatalog, ConfigDescriptor, ConfigFlag, ConfigMap};
pub use diagnostic::{Diagnostic, Recommendation};
pub use icon::Icon;
pub use option::{OptionBody, OptionNode, OptionTreeError, OptionType, USER_INPUT_VALUE};
pub use result::{ScanResultModel, GENERAL_KEY};
