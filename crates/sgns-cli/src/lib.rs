//! SGNS command-line tool
//!
//! The argument definitions live here so tests can parse them without
//! spawning the binary.

pub mod commands;
pub mod exit;
pub mod logging;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use sgns_common::SgnsConfig;
use std::path::{Path, PathBuf};
use tracing::info;

use commands::{BenchCommand, ConfigAction, DemoCommand};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "sgns.toml";

/// SGNS kernel toolkit
#[derive(Parser, Debug)]
#[command(name = "sgns")]
#[command(about = "Benchmark and inspect the skip-gram negative-sampling kernels")]
#[command(long_about = r#"
Tools around the parallel skip-gram negative-sampling training kernels.

Examples:
  # Benchmark every kernel on a synthetic workload
  sgns bench --dim 128 --vocab 50000 --cols 20000

  # Only the windowed kernel, single thread, JSON output
  sgns --threads 1 bench --kernel windowed --format json

  # Run the three-token windowed scenario and print the matrices
  sgns demo

  # Print the effective configuration
  sgns config show
"#)]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Number of worker threads (0 = all logical CPUs)
    #[arg(long, value_name = "N", global = true)]
    pub threads: Option<usize>,

    /// Log level or filter directive (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Time the kernels on seeded synthetic data
    #[command(alias = "benchmark")]
    Bench(BenchCommand),

    /// Run a small hand-checkable windowed update
    Demo(DemoCommand),

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// The clap command, for help and completion tooling.
pub fn build_cli() -> clap::Command {
    Cli::command()
}

/// Resolve configuration: explicit file, else `sgns.toml` if present, else
/// defaults; `SGNS_*` variables apply in every case and flags win last.
pub fn load_configuration(cli: &Cli) -> Result<SgnsConfig> {
    let mut config = match &cli.config {
        Some(path) => load_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => load_file(Path::new(DEFAULT_CONFIG_FILE))?,
        None => SgnsConfig::from_env().context("Failed to read SGNS_* environment overrides")?,
    };

    if let Some(threads) = cli.threads {
        config.kernel.num_threads = threads;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn load_file(path: &Path) -> Result<SgnsConfig> {
    SgnsConfig::load(path).with_context(|| format!("Failed to load configuration: {}", path.display()))
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli, config: &SgnsConfig) -> Result<()> {
    match cli.command {
        Some(Commands::Bench(cmd)) => cmd.execute(config),
        Some(Commands::Demo(cmd)) => cmd.execute(config),
        Some(Commands::Config { action }) => action.execute(config),
        None => {
            info!("No command given");
            build_cli().print_help()?;
            Ok(())
        }
    }
}
