//! Daemon error types.

use ridx_domain::DomainError;
use ridx_engine::EngineError;
use thiserror::Error;

use crate::risk_monitor::MonitorError;

/// Daemon-level errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Domain error (rule document invalid)
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Engine error
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Risk monitor error
    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    /// Security feed could not be read
    #[error("Feed error: {0}")]
    Feed(String),

    /// Report could not be written
    #[error("Report error: {0}")]
    Report(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;
