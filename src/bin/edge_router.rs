use std::io;
use std::process::ExitCode;

use clap::Parser;
use edge_router::cli::{run_cli, Cli};
use edge_router::telemetry::{init_logging_with_config, LogConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match init_logging_with_config(&LogConfig::from_env()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    match run_cli(cli, &mut stdout.lock()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
