//! Composite scoring
//!
//! ```text
//! score = (yield × dividend_weight + ln(market_cap + 1) × market_cap_weight)
//!         × region_factor(region)
//! ```
//!
//! The score is a ranking statistic only. It has no unit and is not a
//! return or a probability.

use ridx_domain::{RuleSet, Security};

/// Computes composite scores under a rule set
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine<'a> {
    rules: &'a RuleSet,
}

impl<'a> ScoringEngine<'a> {
    /// Create a scoring engine borrowing the rule set.
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    /// Composite score of one security.
    ///
    /// The yield term contributes zero when the yield is undefined
    /// (market cap of zero); screening never lets such a security through.
    pub fn score(&self, security: &Security) -> f64 {
        let weighting = &self.rules.weighting;

        let dividend_score = security.dividend_yield().unwrap_or(0.0) * weighting.dividend_weight;
        let market_score = (security.market_cap + 1.0).ln() * weighting.market_cap_weight;

        (dividend_score + market_score) * self.rules.region_factor(&security.region)
    }
}

// =============================================================================
// Tests
// =============================================================================
