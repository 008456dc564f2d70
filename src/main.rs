use pipeinit::cli::commands::{CliArgs, Commands};
use pipeinit::cli::handlers::{handle_manual, handle_scan};
use pipeinit::util::{init_logging, LoggingConfig};
use pipeinit::VERSION;

use clap::Parser;
use tracing::debug;

fn main() {
    let args = CliArgs::parse();
    init_logging(LoggingConfig::from_flags(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
    ));

    debug!("pipeinit v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Scan(scan_args) => handle_scan(scan_args, args.quiet),
        Commands::Manual(manual_args) => handle_manual(manual_args, args.quiet),
    };

    std::process::exit(exit_code);
}
