use std::process::ExitCode;

use cardsheet::logging::init_logging;
use clap::Parser;

mod cli;

use cli::{Cli, report_failure, run, utils};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli.log_config()) {
        eprintln!("failed to set up logging: {err}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&cli, &err);
            if utils::should_pause(cli.debug, cli.no_pause) {
                let _ = utils::pause_for_enter();
            }
            ExitCode::FAILURE
        }
    }
}
