//! Risk Monitor: concentration checks on the live basket
//!
//! The monitor keeps the most recently supplied basket and the installed
//! alert sink behind one lock, and evaluates the basket:
//!
//! - synchronously, whenever `perform_check` is called with a new basket
//! - periodically, from a background task, while running
//!
//! # Lifecycle
//!
//! ```text
//!        start()                 stop().await
//! Idle ──────────→ Running ─────────────────→ Idle
//!   ↑  (no-op if Running)   (cancel + join; no-op if Idle)
//! ```
//!
//! `stop` awaits the background task, so once it returns no further alert
//! is delivered from the background cadence. Dropping a running monitor
//! cancels the task without waiting for it.
//!
//! The lock is held only to copy the basket and sink in or out; evaluation
//! and delivery run outside it.
//!
//! Sinks are called inline on a tokio worker thread. A slow or blocking sink
//! delays the next background wake and blocks that worker while it runs.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use ridx_domain::{AlertSink, Basket, RiskAlert};
use ridx_engine::risk::{evaluate, RiskLimits};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::alert::TracingSink;

// =============================================================================
// State
// =============================================================================

/// Shared state guarded by the monitor lock.
struct MonitorState {
    basket: Basket,
    sink: Arc<dyn AlertSink>,
}

/// Handle on the running background task.
struct MonitorTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

fn lock_state(state: &Mutex<MonitorState>) -> MutexGuard<'_, MonitorState> {
    // State is replaced wholesale, never left half-written
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn snapshot(state: &Mutex<MonitorState>) -> (Basket, Arc<dyn AlertSink>) {
    let guard = lock_state(state);
    (guard.basket.clone(), Arc::clone(&guard.sink))
}

fn deliver_all(sink: &dyn AlertSink, alerts: &[RiskAlert]) {
    for alert in alerts {
        sink.deliver(alert);
    }
}

// =============================================================================
// Risk Monitor
// =============================================================================

/// Evaluates baskets against risk limits and delivers alerts to a sink.
pub struct RiskMonitor {
    state: Arc<Mutex<MonitorState>>,
    limits: RiskLimits,
    interval: Duration,
    task: Mutex<Option<MonitorTask>>,
}

impl RiskMonitor {
    /// Create an idle monitor with default limits and a `TracingSink`.
    pub fn new(interval: Duration) -> Self {
        Self::with_limits(interval, RiskLimits::default())
    }

    /// Create an idle monitor with custom limits.
    pub fn with_limits(interval: Duration, limits: RiskLimits) -> Self {
        Self {
            state: Arc::new(Mutex::new(MonitorState {
                basket: Basket::empty(),
                sink: Arc::new(TracingSink),
            })),
            limits,
            interval,
            task: Mutex::new(None),
        }
    }

    /// Start the background cadence on the current tokio runtime.
    ///
    /// Starting a running monitor is a no-op.
    ///
    /// # Errors
    /// `MonitorError::RuntimeUnavailable` when called outside a runtime.
    pub fn start(&self) -> Result<(), MonitorError> {
        let mut task = self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if task.is_some() {
            debug!("Risk monitor already running");
            return Ok(());
        }

        let runtime = Handle::try_current().map_err(|_| MonitorError::RuntimeUnavailable)?;
        let token = CancellationToken::new();
        let handle = runtime.spawn(run_cadence(
            Arc::clone(&self.state),
            self.limits.clone(),
            self.interval,
            token.clone(),
        ));

        *task = Some(MonitorTask { token, handle });
        info!(interval_ms = self.interval.as_millis() as u64, "Risk monitor started");
        Ok(())
    }

    /// Stop the background cadence and wait for it to finish.
    ///
    /// Stopping an idle monitor is a no-op.
    pub async fn stop(&self) {
        let task = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        let Some(MonitorTask { token, handle }) = task else {
            debug!("Risk monitor already stopped");
            return;
        };

        token.cancel();
        if let Err(e) = handle.await {
            warn!(error = %e, "Risk monitor task ended abnormally");
        }
        info!("Risk monitor stopped");
    }

    /// Whether the background cadence is running.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    /// Store `basket` as the current basket and evaluate it now.
    ///
    /// Returns the alerts that were delivered, in delivery order.
    pub fn perform_check(&self, basket: &Basket) -> Vec<RiskAlert> {
        let sink = {
            let mut state = lock_state(&self.state);
            state.basket = basket.clone();
            Arc::clone(&state.sink)
        };

        let alerts = evaluate(basket, &self.limits);
        deliver_all(sink.as_ref(), &alerts);

        debug!(components = basket.len(), alerts = alerts.len(), "Risk check complete");
        alerts
    }

    /// Replace the alert sink.
    pub fn set_alert_sink(&self, sink: Arc<dyn AlertSink>) {
        lock_state(&self.state).sink = sink;
    }

    /// Emit the fixed circuit-breaker alert.
    pub fn trigger_circuit_breaker(&self) -> RiskAlert {
        let sink = Arc::clone(&lock_state(&self.state).sink);
        let alert = RiskAlert::circuit_breaker();
        warn!("Circuit breaker triggered");
        sink.deliver(&alert);
        alert
    }

    /// Copy of the most recently checked basket.
    pub fn last_basket(&self) -> Basket {
        lock_state(&self.state).basket.clone()
    }

    /// Limits in use
    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }
}

impl Drop for RiskMonitor {
    fn drop(&mut self) {
        let task = self.task.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(task) = task.take() {
            task.token.cancel();
        }
    }
}

/// Background loop: re-evaluate the stored basket every `interval`.
async fn run_cadence(
    state: Arc<Mutex<MonitorState>>,
    limits: RiskLimits,
    interval: Duration,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Risk monitor received shutdown signal");
                break;
            }
            _ = tokio::time::sleep(interval) => {
                let (basket, sink) = snapshot(&state);
                if basket.is_empty() {
                    continue;
                }
                let alerts = evaluate(&basket, &limits);
                deliver_all(sink.as_ref(), &alerts);
            }
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors that can occur in the risk monitor.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// `start` was called outside a tokio runtime
    #[error("No tokio runtime available to run the risk monitor")]
    RuntimeUnavailable,
}

// =============================================================================
// Tests
// =============================================================================
