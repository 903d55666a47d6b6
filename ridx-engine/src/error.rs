//! Engine error types.

use ridx_domain::DomainError;
use thiserror::Error;

/// Errors that can occur while composing a basket.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Domain error (invalid rule set)
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Fixed-point constraint application did not converge
    #[error(
        "Infeasible constraints: caps still violated by {max_violation:.6} after {iterations} iterations"
    )]
    InfeasibleConstraints {
        /// Iterations performed
        iterations: usize,
        /// Largest remaining excess over a cap
        max_violation: f64,
    },
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
