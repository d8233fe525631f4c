//! Subscriber setup
//!
//! Log records from the library crates (`log` facade) are forwarded into
//! the same subscriber. Output goes to stderr so `--format json` results on
//! stdout stay machine-readable.

use anyhow::{Result, anyhow};
use sgns_common::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber. `RUST_LOG` takes precedence over `config.level`.
pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Json => subscriber.json().with_timer(tracing_subscriber::fmt::time::uptime()).finish().try_init(),
        LogFormat::Compact => subscriber.compact().finish().try_init(),
        LogFormat::Pretty => subscriber.pretty().finish().try_init(),
    };
    installed.map_err(|e| anyhow!("Failed to install log subscriber: {e}"))
}
