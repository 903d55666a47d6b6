//! ridx Engine Layer
//!
//! Pure decision logic, deterministic, no I/O.
//! Takes a universe and a rule set → returns a weighted basket,
//! its index value, and the risk alerts it triggers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod composition;
pub mod error;
pub mod filter;
pub mod index_value;
pub mod risk;
pub mod scoring;

pub use composition::{CompositionBuilder, ConstraintStrategy, CAP_TOLERANCE};
pub use error::{EngineError, EngineResult};
pub use filter::EligibilityFilter;
pub use index_value::{index_value, total_value};
pub use risk::RiskLimits;
pub use scoring::ScoringEngine;
