//! Daemon: Main runtime orchestrator.
//!
//! The Daemon ties together all components:
//! - Composition Builder (screen, score, weight)
//! - Risk Monitor (concentration alerts)
//! - Reporter (JSON / XBRL / CSV)
//!
//! # Lifecycle
//!
//! 1. Load configuration
//! 2. Load the rule set (failure aborts startup)
//! 3. Start the risk monitor
//! 4. Run a cycle now, then every cycle interval
//! 5. Graceful shutdown on SIGINT: stop the monitor and wait for it
//!
//! # Cycle
//!
//! ```text
//! feed CSV → CompositionBuilder::build → index_value
//!          → RiskMonitor::perform_check → reports
//! ```

use std::fs;
use std::sync::Arc;

use chrono::Local;
use ridx_domain::{AlertSink, Basket, RiskAlert, RuleSet};
use ridx_engine::CompositionBuilder;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{DaemonError, DaemonResult};
use crate::feed;
use crate::report::Reporter;
use crate::risk_monitor::RiskMonitor;

// =============================================================================
// Cycle Report
// =============================================================================

/// Outcome of one composition cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Time-ordered cycle identifier
    pub cycle_id: Uuid,
    /// Composed basket
    pub basket: Basket,
    /// Published index value
    pub index_value: f64,
    /// Alerts delivered by the synchronous risk check
    pub alerts: Vec<RiskAlert>,
    /// Feed rows skipped as malformed or invalid
    pub rejected_records: usize,
}

// =============================================================================
// Daemon
// =============================================================================

/// The main ridx daemon.
pub struct Daemon {
    /// Configuration
    config: Config,
    /// Basket builder (owns the rule set)
    builder: CompositionBuilder,
    /// Risk monitor
    monitor: RiskMonitor,
    /// Report writer
    reporter: Reporter,
}

impl Daemon {
    /// Create a daemon, loading the rule set named in the configuration.
    ///
    /// # Errors
    /// Fails if the rule document cannot be read or is invalid.
    pub fn new(config: Config) -> DaemonResult<Self> {
        let path = &config.paths.rules_path;
        let document = fs::read_to_string(path).map_err(|e| {
            DaemonError::Config(format!("cannot read rule document {}: {}", path.display(), e))
        })?;
        let rules = RuleSet::from_json_str(&document)?;

        info!(
            path = %path.display(),
            base_value = rules.base_value,
            sector_limits = rules.constraints.sector_limits.len(),
            "Rule set loaded"
        );

        Self::with_rules(config, rules)
    }

    /// Create a daemon with an already-loaded rule set.
    pub fn with_rules(config: Config, rules: RuleSet) -> DaemonResult<Self> {
        let builder = CompositionBuilder::new(rules)?;
        let monitor = RiskMonitor::new(config.schedule.monitor_interval);
        let reporter = Reporter::new(config.paths.report_dir.clone());

        Ok(Self {
            config,
            builder,
            monitor,
            reporter,
        })
    }

    /// Install a different alert sink on the risk monitor.
    pub fn set_alert_sink(&self, sink: Arc<dyn AlertSink>) {
        self.monitor.set_alert_sink(sink);
    }

    /// Risk monitor
    pub fn monitor(&self) -> &RiskMonitor {
        &self.monitor
    }

    /// Run one composition cycle.
    ///
    /// On failure the monitor keeps the basket from the last good cycle.
    pub fn run_cycle(&self) -> DaemonResult<CycleReport> {
        let cycle_id = Uuid::now_v7();
        let span = info_span!("cycle", %cycle_id);
        let _enter = span.enter();

        let load = feed::load_securities(&self.config.paths.feed_path)?;
        let basket = self.builder.build(&load.securities)?;
        let index_value = self.builder.index_value(&basket);

        let alerts = self.monitor.perform_check(&basket);

        self.reporter.write_json(&basket, index_value, cycle_id)?;
        self.reporter.write_xbrl(&basket)?;

        info!(
            index_value,
            components = basket.len(),
            alerts = alerts.len(),
            rejected = load.rejected,
            "Cycle complete"
        );

        Ok(CycleReport {
            cycle_id,
            basket,
            index_value,
            alerts,
            rejected_records: load.rejected,
        })
    }

    /// Run the daemon.
    ///
    /// In run-once mode: one cycle, CSV export, return. Otherwise blocks
    /// until shutdown is requested (SIGINT).
    pub async fn run(self) -> DaemonResult<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.config.environment,
            run_once = self.config.run_once,
            "Starting ridx daemon"
        );

        self.monitor.start()?;

        let result = if self.config.run_once {
            self.run_once()
        } else {
            self.run_loop().await;
            Ok(())
        };

        self.shutdown().await;
        result
    }

    fn run_once(&self) -> DaemonResult<()> {
        let report = self.run_cycle()?;
        let path = self
            .reporter
            .dated_path("ridx_export", Local::now().date_naive(), "csv");
        self.reporter.write_csv(&report.basket, &path)?;

        info!(path = %path.display(), "Run-once complete");
        Ok(())
    }

    async fn run_loop(&self) {
        let mut ticker = tokio::time::interval(self.config.schedule.cycle_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!("Entering main cycle loop");
        loop {
            tokio::select! {
                // First tick completes immediately
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle() {
                        error!(error = %e, "Cycle failed, keeping previous basket");
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }
    }

    /// Graceful shutdown.
    async fn shutdown(&self) {
        info!("Initiating graceful shutdown");

        self.monitor.stop().await;

        let last = self.monitor.last_basket();
        if last.is_empty() {
            warn!("Shutting down with an empty basket");
        }
        info!(components = last.len(), "Shutdown complete");
    }
}

// =============================================================================
// Tests
// =============================================================================
