//! Main entry point for the `courier` binary.

use std::process::ExitCode;

use clap::Parser;
use courier_cli::{Cli, CliError, Exit};
use courier_common_config::{vars, Environment};
use courier_common_log::{LogConfig, LogLevel};
use tracing::error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init(&cli) {
        eprintln!("error: {e}");
        return e.exit_code();
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            return Exit::IoError.into();
        }
    };

    match runtime.block_on(courier_cli::run(&cli, std::io::stdout().lock())) {
        Ok(()) => Exit::Success.into(),
        Err(e) => {
            error!("{e}");
            if let Some(hint) = e.hint() {
                eprintln!("hint: {hint}");
            }
            e.exit_code()
        }
    }
}

/// Load `.env` files and install logging for the chosen verbosity.
fn init(cli: &Cli) -> Result<(), CliError> {
    Environment::init()?;

    let config = LogConfig::from_env();
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => LogLevel::Error,
        (false, 0) if Environment::get(vars::COURIER_LOG_LEVEL).is_some() => config.level,
        (false, n) => LogLevel::from_verbosity(n),
    };

    courier_common_log::init(config.with_level(level))?;
    Ok(())
}
