//! ridx Daemon Library
//!
//! Runtime around the ridx composition engine.
//!
//! # Architecture
//!
//! ```text
//! Feed (CSV) → Composition Builder → Basket → Reporter (JSON / XBRL / CSV)
//!                                       ↓
//!                                 Risk Monitor ──→ Alert Sink
//!                                  (on demand + background cadence)
//! ```
//!
//! # Components
//!
//! - **Daemon**: Main runtime orchestrator
//! - **Risk Monitor**: Concentration checks and circuit breaker
//! - **Alert sinks**: Tracing (default) and bounded channel
//! - **Feed**: CSV security feed loader
//! - **Report**: Compliance report writers
//! - **Config**: Environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use ridxd::{Config, Daemon};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("Failed to load config");
//!     let daemon = Daemon::new(config).expect("Failed to load rules");
//!     daemon.run().await.expect("Daemon error");
//! }
//! ```

#![warn(clippy::all)]

pub mod alert;
pub mod config;
pub mod daemon;
pub mod error;
pub mod feed;
pub mod report;
pub mod risk_monitor;

// Re-exports for convenience
pub use alert::{ChannelSink, TracingSink};
pub use config::{Config, Environment, PathsConfig, ScheduleConfig};
pub use daemon::{CycleReport, Daemon};
pub use error::{DaemonError, DaemonResult};
pub use feed::{load_securities, load_securities_from_reader, FeedLoad};
pub use report::{render_xbrl, Reporter};
pub use risk_monitor::{MonitorError, RiskMonitor};
