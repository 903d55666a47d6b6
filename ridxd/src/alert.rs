//! Alert sinks provided by the daemon.
//!
//! - `TracingSink`: structured log events (the default)
//! - `ChannelSink`: forwards alerts into a bounded tokio channel
//!
//! Closures `Fn(&str)` are sinks too (see `ridx_domain::AlertSink`).

use ridx_domain::{AlertSink, RiskAlert, Severity};
use tokio::sync::mpsc;
use tracing::{error, warn, Level};

// =============================================================================
// Tracing Sink
// =============================================================================

/// Logs each alert: Warning at `warn`, Critical and Halt at `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Log level an alert of the given severity is emitted at.
    pub fn level(severity: Severity) -> Level {
        match severity {
            Severity::Warning => Level::WARN,
            Severity::Critical | Severity::Halt => Level::ERROR,
        }
    }
}

impl AlertSink for TracingSink {
    fn deliver(&self, alert: &RiskAlert) {
        if Self::level(alert.severity) == Level::WARN {
            warn!(severity = %alert.severity, kind = %alert.kind, "{}", alert.message);
        } else {
            error!(severity = %alert.severity, kind = %alert.kind, "{}", alert.message);
        }
    }
}

// =============================================================================
// Channel Sink
// =============================================================================

/// Forwards alerts into a bounded channel without blocking.
///
/// When the channel is full or closed the alert is dropped and a warning is
/// logged; the monitor never waits on a slow consumer.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<RiskAlert>,
}

impl ChannelSink {
    /// Create a sink and the receiver it feeds.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<RiskAlert>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl AlertSink for ChannelSink {
    fn deliver(&self, alert: &RiskAlert) {
        if let Err(e) = self.sender.try_send(alert.clone()) {
            warn!(kind = %alert.kind, error = %e, "Dropping risk alert");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
