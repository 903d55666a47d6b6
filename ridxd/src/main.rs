//! ridx Daemon
//!
//! Composes the index basket on a schedule, monitors it for concentration
//! risk, and writes compliance reports.
//!
//! # Usage
//!
//! ```bash
//! # Start with default configuration
//! cargo run -p ridxd
//!
//! # One cycle with reports, then exit
//! RIDX_RUN_ONCE=true cargo run -p ridxd
//! ```
//!
//! # Environment Variables
//!
//! - `RIDX_ENV`: Environment (test, development, production)
//! - `RIDX_RULES_PATH`: Rule document (default: config/index_rules.json)
//! - `RIDX_FEED_PATH`: Security feed (default: data/securities.csv)
//! - `RIDX_REPORT_DIR`: Report directory (default: reports)
//! - `RIDX_CYCLE_INTERVAL_SECS`: Seconds between cycles (default: 60)
//! - `RIDX_MONITOR_INTERVAL_MS`: Milliseconds between risk checks (default: 1000)
//! - `RIDX_RUN_ONCE`: Run a single cycle and exit (default: false)

use ridxd::{Config, Daemon};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("ridxd=info".parse()?))
        .init();

    // Load configuration
    let config = Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        rules = %config.paths.rules_path.display(),
        feed = %config.paths.feed_path.display(),
        "ridx Daemon"
    );

    // Create and run daemon
    let daemon = Daemon::new(config)?;
    daemon.run().await?;

    Ok(())
}
