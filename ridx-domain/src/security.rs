//! Security records
//!
//! A `Security` is one row of the candidate universe. Records are immutable
//! for the duration of a cycle and are passed into the engine by reference.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

// =============================================================================
// Security
// =============================================================================

/// A listed security eligible for index inclusion
///
/// # Invariants (checked by [`Security::validate`])
/// - `code` is non-empty
/// - all numeric fields are finite
/// - `market_cap >= 0`, `dividend_amt >= 0`
/// - `occupancy_rate` and `debt_ratio` are fractions in [0, 1]
/// - with a positive market cap, the dividend yield is finite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    /// Exchange code, unique within a universe
    pub code: String,
    /// Display name
    pub name: String,
    /// Sector label (matched against sector limits)
    pub sector: String,
    /// Region label (matched against region factors)
    pub region: String,
    /// Market capitalization
    pub market_cap: f64,
    /// Annual distribution amount
    pub dividend_amt: f64,
    /// Occupancy rate, fraction in [0, 1]
    pub occupancy_rate: f64,
    /// Debt ratio, fraction in [0, 1]
    pub debt_ratio: f64,
}

impl Security {
    /// Distribution yield (`dividend_amt / market_cap`).
    ///
    /// Returns `None` when the market cap is zero or negative, where the
    /// ratio is undefined, or when the ratio overflows.
    pub fn dividend_yield(&self) -> Option<f64> {
        if self.market_cap > 0.0 {
            Some(self.dividend_amt / self.market_cap).filter(|y| y.is_finite())
        } else {
            None
        }
    }

    /// Check the record for degenerate values.
    ///
    /// # Errors
    /// Returns `DomainError::Data` naming the security and the offending field.
    pub fn validate(&self) -> DomainResult<()> {
        if self.code.trim().is_empty() {
            return Err(DomainError::Data("security code must be non-empty".to_string()));
        }

        let numeric = [
            ("market_cap", self.market_cap),
            ("dividend_amt", self.dividend_amt),
            ("occupancy_rate", self.occupancy_rate),
            ("debt_ratio", self.debt_ratio),
        ];
        for (field, value) in numeric {
            if !value.is_finite() {
                return Err(self.data_error(field, value, "must be finite"));
            }
        }

        if self.market_cap < 0.0 {
            return Err(self.data_error("market_cap", self.market_cap, "must not be negative"));
        }
        if self.dividend_amt < 0.0 {
            return Err(self.data_error("dividend_amt", self.dividend_amt, "must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.occupancy_rate) {
            return Err(self.data_error("occupancy_rate", self.occupancy_rate, "must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.debt_ratio) {
            return Err(self.data_error("debt_ratio", self.debt_ratio, "must be in [0, 1]"));
        }
        if self.market_cap > 0.0 && self.dividend_yield().is_none() {
            return Err(self.data_error("market_cap", self.market_cap, "overflows the dividend yield"));
        }

        Ok(())
    }

    fn data_error(&self, field: &str, value: f64, reason: &str) -> DomainError {
        DomainError::Data(format!("{}: {} = {} {}", self.code, field, value, reason))
    }
}

// =============================================================================
// Tests
// =============================================================================
