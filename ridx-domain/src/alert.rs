//! Risk alerts and the sink capability that consumes them
//!
//! Alerts carry a structured severity and kind alongside the human-readable
//! message. Sinks that only care about text receive the rendered line through
//! `Display` (see the blanket `AlertSink` impl for closures).

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Severity / Kind
// =============================================================================

/// How urgent an alert is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Approaching a limit
    Warning,
    /// A limit is breached
    Critical,
    /// Manual kill switch; trading must halt
    Halt,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::Halt => write!(f, "HALT"),
        }
    }
}

/// Which rule produced an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    /// Single component weight
    PositionConcentration,
    /// Aggregate sector weight
    SectorConcentration,
    /// Placeholder volatility heuristic
    Volatility,
    /// Manually triggered circuit breaker
    CircuitBreaker,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::PositionConcentration => write!(f, "position_concentration"),
            AlertKind::SectorConcentration => write!(f, "sector_concentration"),
            AlertKind::Volatility => write!(f, "volatility"),
            AlertKind::CircuitBreaker => write!(f, "circuit_breaker"),
        }
    }
}

// =============================================================================
// RiskAlert
// =============================================================================

/// One alert emitted by a risk check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAlert {
    /// Urgency
    pub severity: Severity,
    /// Originating rule
    pub kind: AlertKind,
    /// Human-readable description
    pub message: String,
}

impl RiskAlert {
    /// Create a new alert.
    pub fn new(severity: Severity, kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            message: message.into(),
        }
    }

    /// The fixed circuit-breaker alert
    pub fn circuit_breaker() -> Self {
        Self::new(
            Severity::Halt,
            AlertKind::CircuitBreaker,
            "Circuit breaker triggered! All trading activity suspended",
        )
    }
}

impl fmt::Display for RiskAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

// =============================================================================
// AlertSink
// =============================================================================

/// Consumer of risk alerts
///
/// Implementations must not block for long and must not panic: the risk
/// monitor delivers alerts inline and does not recover from a misbehaving sink.
pub trait AlertSink: Send + Sync {
    /// Deliver a single alert.
    fn deliver(&self, alert: &RiskAlert);
}

/// Any `Fn(&str)` closure is a sink receiving the rendered alert text.
impl<F> AlertSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn deliver(&self, alert: &RiskAlert) {
        self(&alert.to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_display_encodes_severity() {
        let alert = RiskAlert::new(Severity::Critical, AlertKind::PositionConcentration, "too heavy");
        assert_eq!(alert.to_string(), "[CRITICAL] too heavy");
    }

    #[test]
    fn test_circuit_breaker_alert() {
        let alert = RiskAlert::circuit_breaker();
        assert_eq!(alert.severity, Severity::Halt);
        assert_eq!(alert.kind, AlertKind::CircuitBreaker);
        assert!(alert.to_string().starts_with("[HALT]"));
    }

    #[test]
    fn test_closure_is_a_sink() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let captured = received.clone();
        let sink = move |line: &str| captured.lock().unwrap().push(line.to_string());

        sink.deliver(&RiskAlert::new(Severity::Warning, AlertKind::Volatility, "vol 16%"));

        assert_eq!(*received.lock().unwrap(), vec!["[WARNING] vol 16%".to_string()]);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Warning < Severity::Critical);
        assert!(Severity::Critical < Severity::Halt);
    }
}
