// vidmark-cli/src/main.rs
//
// Entry point of the `vidmark` binary.
//
// Exit codes:
// - 0: the job completed and the output video was written
// - 1: the job failed (model, input, output or processing error)
// - 2: invalid arguments or settings, rejected before the job starts

use clap::Parser;
use std::process;
use vidmark_cli::logging::init_logging;
use vidmark_cli::{Cli, build_config, run_annotate};

const SETUP_ERROR_EXIT: i32 = 2;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Error: {e}");
        process::exit(SETUP_ERROR_EXIT);
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(SETUP_ERROR_EXIT);
        }
    };

    let outcome = run_annotate(config, &cli.input);
    process::exit(outcome.exit_code());
}
