use std::process::ExitCode;

use agentcanvas::{cli, logger};
use clap::Parser;

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();

    // Session log (overwrites previous session log)
    logger::init(args.verbose);
    if args.verbose {
        if let Some(path) = logger::log_path() {
            eprintln!("log: {}", path.display());
        }
    }

    cli::run(args)
}
