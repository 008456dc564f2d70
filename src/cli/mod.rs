pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, ManualArgs, OutputFormatArg, ScanArgs};
pub use handlers::{handle_manual, handle_scan, write_pipeline, PIPELINE_FILE_NAME};
pub use output::{OutputFormat, OutputFormatter};
