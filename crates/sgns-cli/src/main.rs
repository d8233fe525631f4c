//! `sgns` binary entry point

use clap::Parser;
use sgns_cli::exit::{EXIT_SUCCESS, code_for};
use sgns_cli::logging::setup_logging;
use sgns_cli::{Cli, load_configuration, run};
use tracing::error;

fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(config) => config,
        Err(e) => {
            // No subscriber yet.
            eprintln!("error: {e:#}");
            std::process::exit(code_for(&e));
        }
    };

    if let Err(e) = setup_logging(&config.logging) {
        eprintln!("warning: {e:#}");
    }

    let code = match run(cli, &config) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            error!("Command failed: {}", e);
            let mut source = e.source();
            while let Some(err) = source {
                error!("  Caused by: {}", err);
                source = err.source();
            }
            code_for(&e)
        }
    };
    std::process::exit(code);
}
