//! ridx Domain Layer
//!
//! Pure domain types with zero I/O dependencies.
//! Contains security records, the index rule set, baskets and risk alerts.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod alert;
pub mod basket;
pub mod error;
pub mod rules;
pub mod security;

// Re-export commonly used types
pub use alert::{AlertKind, AlertSink, RiskAlert, Severity};
pub use basket::{Basket, Component, MAX_COMPONENTS};
pub use error::{DomainError, DomainResult};
pub use rules::{
    ConstraintRules, RuleSet, ScreeningRules, WeightingRules, DEFAULT_REGION_FACTOR,
};
pub use security::Security;
