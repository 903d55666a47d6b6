//! Alert sink that records deliveries.

use std::sync::{Arc, Mutex};

use ridx_domain::{AlertKind, AlertSink, RiskAlert, Severity};

/// Sink collecting every delivered alert.
///
/// Clones share the same buffer, so a test can keep one handle and install
/// another in the monitor.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    alerts: Arc<Mutex<Vec<RiskAlert>>>,
}

impl CollectingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything delivered so far.
    pub fn alerts(&self) -> Vec<RiskAlert> {
        self.alerts.lock().unwrap().clone()
    }

    /// Number of alerts delivered.
    pub fn len(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }

    /// True when nothing was delivered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of alerts with the given severity.
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.severity == severity)
            .count()
    }

    /// Number of alerts of the given kind.
    pub fn count_kind(&self, kind: AlertKind) -> usize {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.kind == kind)
            .count()
    }

    /// Forget everything delivered so far.
    pub fn clear(&self) {
        self.alerts.lock().unwrap().clear();
    }
}

impl AlertSink for CollectingSink {
    fn deliver(&self, alert: &RiskAlert) {
        self.alerts.lock().unwrap().push(alert.clone());
    }
}
