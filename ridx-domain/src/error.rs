//! Domain error types.

/// Domain errors raised while validating rule sets and security records
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Rule set is missing a field or carries an out-of-range value.
    ///
    /// Fatal to the cycle that tried to use it.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Security record is degenerate (non-finite numbers, fractions outside [0,1], ...).
    ///
    /// The offending record is excluded; the cycle continues.
    #[error("Data error: {0}")]
    Data(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
