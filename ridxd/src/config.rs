//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input and output locations
    pub paths: PathsConfig,

    /// Cycle and monitor cadence
    pub schedule: ScheduleConfig,

    /// Run a single cycle, write reports, exit
    pub run_once: bool,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// File locations.
#[derive(Debug, Clone)]
pub struct PathsConfig {
    /// Rule document (JSON)
    pub rules_path: PathBuf,
    /// Security feed (CSV)
    pub feed_path: PathBuf,
    /// Directory reports are written into
    pub report_dir: PathBuf,
}

/// Timing configuration.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Interval between composition cycles
    pub cycle_interval: Duration,
    /// Interval between background risk checks
    pub monitor_interval: Duration,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let environment = Self::load_environment()?;
        let paths = Self::load_paths_config();
        let schedule = Self::load_schedule_config()?;
        let run_once = Self::load_parsed_env("RIDX_RUN_ONCE", false)?;

        Ok(Self {
            paths,
            schedule,
            run_once,
            environment,
        })
    }

    /// Create test configuration rooted at `dir`.
    pub fn test(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            paths: PathsConfig {
                rules_path: dir.join("index_rules.json"),
                feed_path: dir.join("securities.csv"),
                report_dir: dir.join("reports"),
            },
            schedule: ScheduleConfig {
                cycle_interval: Duration::from_millis(50),
                monitor_interval: Duration::from_millis(10),
            },
            run_once: true,
            environment: Environment::Test,
        }
    }

    fn load_environment() -> DaemonResult<Environment> {
        let env_str = env::var("RIDX_ENV").unwrap_or_else(|_| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(DaemonError::Config(format!(
                "Invalid RIDX_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }

    fn load_paths_config() -> PathsConfig {
        let defaults = PathsConfig::default();

        PathsConfig {
            rules_path: env::var("RIDX_RULES_PATH").map(PathBuf::from).unwrap_or(defaults.rules_path),
            feed_path: env::var("RIDX_FEED_PATH").map(PathBuf::from).unwrap_or(defaults.feed_path),
            report_dir: env::var("RIDX_REPORT_DIR").map(PathBuf::from).unwrap_or(defaults.report_dir),
        }
    }

    fn load_schedule_config() -> DaemonResult<ScheduleConfig> {
        let cycle_secs: u64 = Self::load_parsed_env("RIDX_CYCLE_INTERVAL_SECS", 60)?;
        let monitor_ms: u64 = Self::load_parsed_env("RIDX_MONITOR_INTERVAL_MS", 1_000)?;

        if cycle_secs == 0 || monitor_ms == 0 {
            return Err(DaemonError::Config(
                "RIDX_CYCLE_INTERVAL_SECS and RIDX_MONITOR_INTERVAL_MS must be positive".to_string(),
            ));
        }

        Ok(ScheduleConfig {
            cycle_interval: Duration::from_secs(cycle_secs),
            monitor_interval: Duration::from_millis(monitor_ms),
        })
    }

    fn load_parsed_env<T: FromStr>(key: &str, default: T) -> DaemonResult<T> {
        match env::var(key) {
            Ok(val) => val
                .trim()
                .parse::<T>()
                .map_err(|_| DaemonError::Config(format!("Invalid {} value: {}", key, val))),
            Err(_) => Ok(default),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from("config/index_rules.json"),
            feed_path: PathBuf::from("data/securities.csv"),
            report_dir: PathBuf::from("reports"),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cycle_interval: Duration::from_secs(60),
            monitor_interval: Duration::from_millis(1_000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            schedule: ScheduleConfig::default(),
            run_once: false,
            environment: Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
